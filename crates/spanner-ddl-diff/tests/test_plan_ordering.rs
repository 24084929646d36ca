//! Ordering and policy-gating properties of generated plans.

use spanner_ddl_diff::{DdlDiff, DdlDiffError, DiffOptions, Schema};

const ALL_ALLOWED: DiffOptions = DiffOptions {
    allow_recreate_indexes: true,
    allow_recreate_constraints: true,
    allow_drop_statements: true,
};

fn diff(original: &str, new: &str, options: &DiffOptions) -> Vec<String> {
    DdlDiff::build(original, new)
        .unwrap()
        .generate_difference_statements(options)
        .unwrap()
}

#[test]
fn test_full_category_ordering() {
    let original = "CREATE TABLE P (id INT64) PRIMARY KEY (id);\
         CREATE TABLE Dead (id INT64, ts TIMESTAMP) PRIMARY KEY (id);\
         CREATE TABLE Mod (id INT64, a STRING(10), ts TIMESTAMP) PRIMARY KEY (id);\
         CREATE INDEX DeadIdx ON P(id);\
         CREATE INDEX ModIdx ON Mod(a);\
         ALTER TABLE Mod ADD CONSTRAINT ck_dead CHECK (id > 0);\
         ALTER TABLE Mod ADD CONSTRAINT ck_mod CHECK (id > 1);\
         ALTER TABLE Dead ADD ROW DELETION POLICY (OLDER_THAN(ts, INTERVAL 1 DAY));\
         ALTER TABLE Mod ADD ROW DELETION POLICY (OLDER_THAN(ts, INTERVAL 1 DAY));\
         CREATE CHANGE STREAM DeadStream FOR ALL;\
         CREATE CHANGE STREAM ModStream FOR P OPTIONS (retention_period='24h');\
         ALTER DATABASE db SET OPTIONS (version_retention_period='1d')";

    let new = "CREATE TABLE P (id INT64) PRIMARY KEY (id);\
         CREATE TABLE Mod (id INT64, a STRING(20), ts TIMESTAMP, b BOOL) PRIMARY KEY (id);\
         CREATE TABLE NewT (id INT64) PRIMARY KEY (id);\
         CREATE TABLE NewC (id INT64, cid INT64) PRIMARY KEY (id, cid), INTERLEAVE IN PARENT NewT;\
         CREATE INDEX ModIdx ON Mod(b);\
         CREATE INDEX NewIdx ON NewT(id);\
         ALTER TABLE Mod ADD CONSTRAINT ck_mod CHECK (id > 2);\
         ALTER TABLE NewT ADD CONSTRAINT ck_new CHECK (id > 0);\
         ALTER TABLE Mod ADD ROW DELETION POLICY (OLDER_THAN(ts, INTERVAL 2 DAY));\
         CREATE CHANGE STREAM ModStream FOR P, Mod OPTIONS (retention_period='48h');\
         CREATE CHANGE STREAM NewStream FOR ALL;\
         ALTER DATABASE db SET OPTIONS (version_retention_period='7d')";

    let statements = diff(original, new, &ALL_ALLOWED);
    assert_eq!(
        statements,
        vec![
            "ALTER DATABASE db SET OPTIONS (version_retention_period='7d')",
            "DROP INDEX DeadIdx",
            "DROP CHANGE STREAM DeadStream",
            "DROP INDEX ModIdx",
            "ALTER TABLE Mod DROP CONSTRAINT ck_dead",
            "ALTER TABLE Mod DROP CONSTRAINT ck_mod",
            "ALTER TABLE Dead DROP ROW DELETION POLICY",
            "DROP TABLE Dead",
            "ALTER TABLE Mod ADD COLUMN b BOOL",
            "ALTER TABLE Mod ALTER COLUMN a STRING(20)",
            "CREATE TABLE NewT (id INT64) PRIMARY KEY(id)",
            "CREATE TABLE NewC (id INT64, cid INT64) PRIMARY KEY(id, cid), \
             INTERLEAVE IN PARENT NewT ON DELETE NO ACTION",
            "ALTER TABLE Mod REPLACE ROW DELETION POLICY (OLDER_THAN(ts, INTERVAL 2 DAY))",
            "CREATE INDEX NewIdx ON NewT(id)",
            "CREATE INDEX ModIdx ON Mod(b)",
            "ALTER TABLE NewT ADD CONSTRAINT ck_new CHECK (id > 0)",
            "ALTER TABLE Mod ADD CONSTRAINT ck_mod CHECK (id > 2)",
            "CREATE CHANGE STREAM NewStream FOR ALL",
            "ALTER CHANGE STREAM ModStream SET FOR P, Mod",
            "ALTER CHANGE STREAM ModStream SET OPTIONS (retention_period='48h')",
        ]
    );
}

#[test]
fn test_new_interleaved_tables_create_parent_first() {
    let statements = diff(
        "",
        "CREATE TABLE P (id INT64) PRIMARY KEY (id);\
         CREATE TABLE C (id INT64, cid INT64) PRIMARY KEY (id, cid), \
         INTERLEAVE IN PARENT P ON DELETE CASCADE",
        &DiffOptions::default(),
    );
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE P (id INT64) PRIMARY KEY(id)",
            "CREATE TABLE C (id INT64, cid INT64) PRIMARY KEY(id, cid), \
             INTERLEAVE IN PARENT P ON DELETE CASCADE",
        ]
    );
}

#[test]
fn test_drop_policy_suppresses_removals_but_not_recreations() {
    let original = "CREATE TABLE T (id INT64, gone STRING(10)) PRIMARY KEY (id);\
         CREATE TABLE Gone (id INT64) PRIMARY KEY (id);\
         CREATE INDEX GoneIdx ON T(id);\
         CREATE INDEX ChangedIdx ON T(gone);\
         CREATE CHANGE STREAM GoneStream FOR ALL";
    let new = "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         CREATE INDEX ChangedIdx ON T(id)";

    let options = DiffOptions {
        allow_recreate_indexes: true,
        ..DiffOptions::default()
    };
    let statements = diff(original, new, &options);
    assert_eq!(
        statements,
        vec!["DROP INDEX ChangedIdx", "CREATE INDEX ChangedIdx ON T(id)"]
    );
}

#[test]
fn test_modified_index_without_flag_fails_atomically() {
    // Even changes that would otherwise emit statements must not leak out.
    let err = DdlDiff::build(
        "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         CREATE INDEX I ON T(id)",
        "CREATE TABLE T (id INT64, extra BOOL) PRIMARY KEY (id);\
         CREATE INDEX I ON T(id DESC)",
    )
    .unwrap()
    .generate_difference_statements(&DiffOptions::default())
    .unwrap_err();
    match err {
        DdlDiffError::RecreateNotPermitted { flag, names, .. } => {
            assert_eq!(flag, "allowRecreateIndexes");
            assert!(names.contains('I'));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_modified_constraint_without_flag_fails() {
    let err = DdlDiff::build(
        "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         ALTER TABLE T ADD CONSTRAINT ck CHECK (id > 0)",
        "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         ALTER TABLE T ADD CONSTRAINT ck CHECK (id > 1)",
    )
    .unwrap()
    .generate_difference_statements(&DiffOptions::default())
    .unwrap_err();
    match err {
        DdlDiffError::RecreateNotPermitted { flag, names, .. } => {
            assert_eq!(flag, "allowRecreateConstraints");
            assert!(names.contains("ck"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_drop_add_pairing_for_modified_constraints() {
    let statements = diff(
        "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         ALTER TABLE T ADD CONSTRAINT ck CHECK (id > 0)",
        "CREATE TABLE T (id INT64) PRIMARY KEY (id);\
         ALTER TABLE T ADD CONSTRAINT ck CHECK (id > 1)",
        &ALL_ALLOWED,
    );
    let drop_pos = statements
        .iter()
        .position(|s| s == "ALTER TABLE T DROP CONSTRAINT ck")
        .unwrap();
    let add_pos = statements
        .iter()
        .position(|s| s == "ALTER TABLE T ADD CONSTRAINT ck CHECK (id > 1)")
        .unwrap();
    assert!(drop_pos < add_pos);
}

#[test]
fn test_constraint_moves_between_tables() {
    // Same name, new owning table: dropped from the original owner, added
    // to the new one.
    let statements = diff(
        "CREATE TABLE A (id INT64) PRIMARY KEY (id);\
         CREATE TABLE B (id INT64) PRIMARY KEY (id);\
         ALTER TABLE A ADD CONSTRAINT ck CHECK (id > 0)",
        "CREATE TABLE A (id INT64) PRIMARY KEY (id);\
         CREATE TABLE B (id INT64) PRIMARY KEY (id);\
         ALTER TABLE B ADD CONSTRAINT ck CHECK (id > 0)",
        &ALL_ALLOWED,
    );
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE A DROP CONSTRAINT ck",
            "ALTER TABLE B ADD CONSTRAINT ck CHECK (id > 0)",
        ]
    );
}

#[test]
fn test_extraction_round_trip_is_stable() {
    let ddl = "CREATE TABLE Singers (SingerId INT64 NOT NULL, Name STRING(1024), \
         ts TIMESTAMP OPTIONS (allow_commit_timestamp=true)) PRIMARY KEY (SingerId);\
         CREATE TABLE Albums (SingerId INT64 NOT NULL, AlbumId INT64 NOT NULL) \
         PRIMARY KEY (SingerId, AlbumId), INTERLEAVE IN PARENT Singers ON DELETE CASCADE;\
         CREATE UNIQUE INDEX AlbumsById ON Albums(AlbumId) STORING (SingerId);\
         ALTER TABLE Albums ADD CONSTRAINT fk FOREIGN KEY (SingerId) REFERENCES Singers (SingerId);\
         ALTER TABLE Singers ADD ROW DELETION POLICY (OLDER_THAN(ts, INTERVAL 30 DAY));\
         CREATE CHANGE STREAM SingerStream FOR Singers OPTIONS (retention_period='36h');\
         ALTER DATABASE music SET OPTIONS (version_retention_period='7d')";

    let schema = Schema::from_ddl(ddl).unwrap();
    let round_tripped = Schema::from_ddl(&schema.render()).unwrap();
    assert_eq!(schema, round_tripped);

    // A schema diffed against its own rendering is empty.
    let statements = diff(ddl, &schema.render(), &ALL_ALLOWED);
    assert!(statements.is_empty(), "unexpected statements: {statements:?}");
}
