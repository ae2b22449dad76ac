//! End-to-end generation over IDL files on disk.

use protoforge_codegen::pipeline::{
    GenerateOptions, RouterTarget, generate, resolve_base_package,
};
use protoforge_codegen::{GenerationReport, TemplateEngine};
use protoforge_core::cli::GenerationMode;
use protoforge_core::{Error, GeneratorConfig};
use std::fs;
use std::path::{Path, PathBuf};

const BASE: &str = "example.com/app";

const AUTHOR_PROTO: &str = r#"syntax = "proto3";

option go_package = "./blog;blog";

message AuthorModel {
  int64 id = 1;
  string name = 2;
}
"#;

const POST_PROTO: &str = r#"syntax = "proto3";

import "author.proto";

message CommentData {
  string body = 1;
}

// @softDelete
message PostModel {
  string title = 1;
  // @pk
  int64 post_id = 2;
  // @belongsTo
  AuthorModel author = 3;
  // @hasMany
  repeated CommentData comments = 4;
}
"#;

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).unwrap();
    path
}

fn options(mode: GenerationMode, src: &Path, out: &Path) -> GenerateOptions {
    GenerateOptions {
        mode,
        base_package: BASE.to_string(),
        working_dir: src.to_path_buf(),
        out_dir: out.to_path_buf(),
        config: GeneratorConfig::default(),
    }
}

fn run(
    mode: GenerationMode,
    files: &[PathBuf],
    src: &Path,
    out: &Path,
) -> protoforge_core::Result<GenerationReport> {
    let engine = TemplateEngine::builtin(mode).unwrap();
    generate(files, &engine, &options(mode, src, out))
}

#[test]
fn test_cross_file_relation() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(src.path(), "author.proto", AUTHOR_PROTO);
    let post = write(src.path(), "post.proto", POST_PROTO);

    let report = run(GenerationMode::Host, &[post], src.path(), out.path()).unwrap();
    assert_eq!(report.schemas, 2);
    assert_eq!(report.files[0], out.path().join("models/blog/Author_gen.go"));
    assert!(report.files.contains(&out.path().join("models/Post_gen.go")));

    let content = fs::read_to_string(out.path().join("models/Post_gen.go")).unwrap();
    assert!(content.contains("blog \"example.com/app/models/blog\""));
    assert!(content.contains("\tAuthor *blog.AuthorModel `json:\"author\"`"));
    assert!(content.contains("\"posts\").SetPrimaryKey(\"post_id\").SetSoftDeleteColumn(\"deleted_at\")"));
    assert!(content.contains("db:\"post_id;type:BIGINT;not null;primary key\""));
    // not a relation: the type is not a Model
    assert!(content.contains("db:\"comments;type:json;not null;\""));

    let author = fs::read_to_string(out.path().join("models/blog/Author_gen.go")).unwrap();
    assert!(author.contains("package blog"));
    assert!(author.contains("\"authors\").SetPrimaryKey(\"id\")"));
}

#[test]
fn test_colliding_package_aliases() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(
        src.path(),
        "auth.proto",
        "syntax = \"proto3\";\noption go_package = \"./auth\";\n\
         message UserModel { int64 id = 1; }\nenum RoleEnum { GUEST = 0; ADMIN = 1; }\n",
    );
    let profile = write(
        src.path(),
        "profile.proto",
        "syntax = \"proto3\";\nimport \"auth.proto\";\n\
         message ProfileResult { UserModel user = 1; RoleEnum role = 2; Money balance = 3; }\n",
    );

    run(GenerationMode::Host, &[profile], src.path(), out.path()).unwrap();
    let content = fs::read_to_string(out.path().join("results/Profile_gen.go")).unwrap();
    assert!(content.contains("\tauth \"example.com/app/models/auth\""));
    assert!(content.contains("\tauth1 \"example.com/app/enums/auth\""));
    assert!(content.contains("User auth.UserModel"));
    assert!(content.contains("Role auth1.RoleEnum"));
    // unknown types stay as written
    assert!(content.contains("Balance Money"));
}

#[test]
fn test_circular_import_writes_nothing() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let a = write(
        src.path(),
        "a.proto",
        "syntax = \"proto3\";\nimport \"b.proto\";\nmessage AModel { int64 id = 1; }\n",
    );
    write(
        src.path(),
        "b.proto",
        "syntax = \"proto3\";\nimport \"a.proto\";\nmessage BModel { int64 id = 1; }\n",
    );

    let err = run(GenerationMode::Host, &[a], src.path(), out.path()).unwrap_err();
    match err {
        Error::CircularImport { chain } => {
            assert_eq!(chain.len(), 3);
            assert_eq!(chain.first(), chain.last());
        }
        other => panic!("expected CircularImport, got {other:?}"),
    }
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_import_is_skipped() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let file = write(
        src.path(),
        "order.proto",
        "syntax = \"proto3\";\nimport \"money.proto\";\nmessage OrderResult { Money total = 1; }\n",
    );
    let report = run(GenerationMode::Host, &[file], src.path(), out.path()).unwrap();
    assert_eq!(report.schemas, 1);
    let content = fs::read_to_string(out.path().join("results/Order_gen.go")).unwrap();
    assert!(content.contains("Total Money"));
}

#[test]
fn test_sdk_and_host_runs_are_independent() {
    let src = tempfile::tempdir().unwrap();
    let host_out = tempfile::tempdir().unwrap();
    let sdk_out = tempfile::tempdir().unwrap();
    write(src.path(), "author.proto", AUTHOR_PROTO);
    let post = write(src.path(), "post.proto", POST_PROTO);

    run(GenerationMode::Host, &[post.clone()], src.path(), host_out.path()).unwrap();
    let report = run(GenerationMode::Sdk, &[post], src.path(), sdk_out.path()).unwrap();
    assert!(report.routers.is_empty());
    assert!(report.files.iter().all(|p| p.extension().is_some_and(|e| e == "ts")));

    let sdk = fs::read_to_string(sdk_out.path().join("models/Post_gen.ts")).unwrap();
    assert!(sdk.contains("import type { AuthorModel } from \"./blog/Author_gen\";"));
    assert!(!sdk.contains("blog.AuthorModel"));

    let host = fs::read_to_string(host_out.path().join("models/Post_gen.go")).unwrap();
    assert!(host.contains("*blog.AuthorModel"));
    assert!(!host.contains("import type"));
}

#[test]
fn test_router_targets() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let auth = write(
        src.path(),
        "auth.proto",
        "syntax = \"proto3\";\nmessage LoginReq { string name = 1; }\n\
         message LoginResult { string token = 1; }\n\
         // @controller:/auth\nservice AuthService { rpc Login(LoginReq) returns (LoginResult); }\n",
    );
    let shop = write(
        src.path(),
        "shop.proto",
        "syntax = \"proto3\";\noption go_package = \"./shop\";\n\
         message ListReq { int32 page = 1; }\nmessage ListResult { int32 total = 1; }\n\
         service ShopController { rpc List(ListReq) returns (ListResult); }\n\
         service InternalService { rpc Sync(ListReq) returns (ListResult); }\n",
    );

    let report = run(GenerationMode::Host, &[auth, shop], src.path(), out.path()).unwrap();
    assert_eq!(
        report.routers,
        vec![
            RouterTarget {
                import_path: None,
                call: "AuthServiceRouter(router)".to_string(),
            },
            RouterTarget {
                import_path: Some("example.com/app/controllers/shop".to_string()),
                call: "shop.ShopControllerRouter(router)".to_string(),
            },
        ]
    );
    assert!(out.path().join("controllers/Auth_gen.go").is_file());
    assert!(out.path().join("services/shop/Internal_gen.go").is_file());
}

#[test]
fn test_missing_template_aborts_run() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let post = write(src.path(), "author.proto", AUTHOR_PROTO);
    let engine = TemplateEngine::empty();
    let err = generate(&[post], &engine, &options(GenerationMode::Host, src.path(), out.path()))
        .unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound { ref name } if name == "model"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_custom_template_directory() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let tmpl = tempfile::tempdir().unwrap();
    fs::write(tmpl.path().join("model.hbs"), "model {{Name}} in {{Package}}\n").unwrap();
    let author = write(src.path(), "author.proto", AUTHOR_PROTO);

    let engine = TemplateEngine::from_path(tmpl.path()).unwrap();
    generate(&[author], &engine, &options(GenerationMode::Host, src.path(), out.path())).unwrap();
    let content = fs::read_to_string(out.path().join("models/blog/Author_gen.go")).unwrap();
    assert_eq!(content, "model AuthorModel in blog\n");
}

#[test]
fn test_base_package_resolution() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("go.mod"), "module example.com/shop\n\ngo 1.22\n").unwrap();
    let out = root.path().join("internal");
    fs::create_dir_all(&out).unwrap();

    let config = GeneratorConfig::default();
    assert_eq!(
        resolve_base_package(&config, &out, "app").unwrap(),
        "example.com/shop/internal"
    );

    let pinned = GeneratorConfig {
        base_package: Some("github.com/acme/api".to_string()),
        ..GeneratorConfig::default()
    };
    assert_eq!(
        resolve_base_package(&pinned, &out, "app").unwrap(),
        "github.com/acme/api"
    );
}
