//! Rendering schema nodes through templates and writing the results.
//!
//! Every node is rendered before anything is written, so a template error
//! leaves the output tree untouched.

use crate::imports::{ImportSet, ServiceTarget, resolve_message, resolve_service};
use crate::naming::package_base;
use crate::schema::{
    Enum, EnumValue, Field, Message, Method, ProtoSchema, Service, ServiceGroup, TypeRegistry,
};
use crate::template_engine::TemplateEngine;
use protoforge_core::cli::GenerationMode;
use protoforge_core::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Settings shared by every rendered file.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Host or SDK generation
    pub mode: GenerationMode,
    /// Provenance header placed at the top of each file
    pub header: String,
    /// Output file extension without the dot
    pub extension: String,
    /// Import path of the response helpers used by controllers
    pub response_path: String,
}

/// One rendered output file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the output root
    pub path: String,
    /// Template that produced it
    pub template: String,
    /// File contents
    pub content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessageContext<'a> {
    header: &'a str,
    imports: &'a ImportSet,
    model: &'a Message,
    package: &'a str,
    name: &'a str,
    fields: &'a [Field],
    relations: &'a [Field],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceContext<'a> {
    header: &'a str,
    imports: &'a ImportSet,
    service: &'a Service,
    package: &'a str,
    name: &'a str,
    methods: &'a [Method],
    import_path: &'a str,
    usage_name: String,
    middlewares: &'a [String],
    prefix: &'a str,
    service_import: &'a str,
    response_path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EnumContext<'a> {
    header: &'a str,
    imports: &'a ImportSet,
    #[serde(rename = "Enum")]
    decl: &'a Enum,
    package: &'a str,
    name: &'a str,
    values: &'a [EnumValue],
}

/// Renders schema nodes with one template set.
#[derive(Debug)]
pub struct Emitter<'e, 'r> {
    engine: &'e TemplateEngine<'r>,
    options: EmitOptions,
}

impl<'e, 'r> Emitter<'e, 'r> {
    /// Creates an emitter.
    #[must_use]
    pub const fn new(engine: &'e TemplateEngine<'r>, options: EmitOptions) -> Self {
        Self { engine, options }
    }

    /// Renders every node of `schema` that the current mode generates.
    ///
    /// Host mode renders all messages, enums, services and controllers; SDK
    /// mode renders messages, enums and controllers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] or [`Error::Template`] for the
    /// first node that fails.
    pub fn render_schema(
        &self,
        schema: &ProtoSchema,
        registry: &TypeRegistry,
    ) -> Result<Vec<RenderedFile>> {
        let mut files = Vec::new();
        for message in schema.messages() {
            files.push(self.render_message(message, registry)?);
        }
        for decl in &schema.enums {
            files.push(self.render_enum(decl)?);
        }
        for service in schema.all_services() {
            files.extend(self.render_service(service)?);
        }
        Ok(files)
    }

    /// Renders one message.
    ///
    /// # Errors
    ///
    /// Fails if the message's template is missing or does not render.
    pub fn render_message(
        &self,
        message: &Message,
        registry: &TypeRegistry,
    ) -> Result<RenderedFile> {
        let (resolved, imports) = resolve_message(message, registry, self.options.mode);
        let context = MessageContext {
            header: &self.options.header,
            imports: &imports,
            model: &resolved,
            package: &resolved.package,
            name: &resolved.name,
            fields: &resolved.fields,
            relations: &resolved.relations,
        };
        self.render(&resolved.template, &resolved.file_path, &context)
    }

    /// Renders one enum.
    ///
    /// # Errors
    ///
    /// Fails if the `enum` template is missing or does not render.
    pub fn render_enum(&self, decl: &Enum) -> Result<RenderedFile> {
        let context = EnumContext {
            header: &self.options.header,
            imports: &ImportSet::new(),
            decl,
            package: &decl.package,
            name: &decl.name,
            values: &decl.values,
        };
        self.render("enum", &decl.file_path, &context)
    }

    /// Renders a service: its own file and, for an `@controller` service,
    /// the generated controller. SDK mode renders controllers only.
    ///
    /// # Errors
    ///
    /// Fails if a required template is missing or does not render.
    pub fn render_service(&self, service: &Service) -> Result<Vec<RenderedFile>> {
        let mut files = Vec::new();
        let own_is_controller = service.group == ServiceGroup::Controllers;
        if !self.options.mode.is_sdk() || own_is_controller {
            files.push(self.render_service_file(
                service,
                ServiceTarget::own(service),
                &service.package_name,
                String::new(),
                &service.template,
            )?);
        }
        if let Some(target) = ServiceTarget::controller(service) {
            let package = package_base(&service.controller_import_path).to_string();
            let usage_name = format!("svc.{}", service.name);
            files.push(self.render_service_file(
                service,
                target,
                &package,
                usage_name,
                ServiceGroup::Controllers.template(),
            )?);
        }
        Ok(files)
    }

    fn render_service_file(
        &self,
        service: &Service,
        mut target: ServiceTarget<'_>,
        package: &str,
        usage_name: String,
        template: &str,
    ) -> Result<RenderedFile> {
        if self.options.mode.is_sdk() {
            // SDK modules import types by name only
            target.preset = ImportSet::new();
        }
        let import_path = target.import_path.to_string();
        let file_path = target.file_path.to_string();
        let (resolved, imports) = resolve_service(service, target, self.options.mode);
        let context = ServiceContext {
            header: &self.options.header,
            imports: &imports,
            service: &resolved,
            package,
            name: &resolved.name,
            methods: &resolved.methods,
            import_path: &import_path,
            usage_name,
            middlewares: &resolved.middlewares,
            prefix: &resolved.prefix,
            service_import: &resolved.import_path,
            response_path: &self.options.response_path,
        };
        self.render(template, &file_path, &context)
    }

    fn render<T: Serialize>(
        &self,
        template: &str,
        path: &str,
        context: &T,
    ) -> Result<RenderedFile> {
        let content = self.engine.render(template, context)?;
        Ok(RenderedFile {
            path: with_extension(path, &self.options.extension),
            template: template.to_string(),
            content,
        })
    }
}

/// Writes rendered files under `out_dir`, creating directories as needed.
///
/// Returns the absolute paths written, in order.
///
/// # Errors
///
/// Returns [`Error::Io`] on the first directory or file that cannot be
/// written.
pub fn write_files(out_dir: &Path, files: &[RenderedFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = out_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&path, &file.content).map_err(|e| Error::io(&path, e))?;
        tracing::info!("Generated {} ({})", path.display(), file.template);
        written.push(path);
    }
    Ok(written)
}

/// Replaces a trailing `.go` with `.<extension>`.
fn with_extension(path: &str, extension: &str) -> String {
    let stem = path.strip_suffix(".go").unwrap_or(path);
    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaContext;

    fn options(mode: GenerationMode) -> EmitOptions {
        EmitOptions {
            mode,
            header: "// Code generated by protoforge. DO NOT EDIT.".to_string(),
            extension: if mode.is_sdk() { "ts" } else { "go" }.to_string(),
            response_path: "example.com/app/response".to_string(),
        }
    }

    fn extract(source: &str) -> (SchemaContext, std::rc::Rc<ProtoSchema>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.proto");
        std::fs::write(&path, source).unwrap();
        let mut ctx = SchemaContext::new("example.com/app", dir.path());
        let schema = ctx.extract_file(&path, "").unwrap();
        (ctx, schema)
    }

    const SOURCE: &str = r#"syntax = "proto3";

// @table:members
// @authenticatable
message UserModel {
  int64 id = 1;
  string name = 2;
  repeated string tags = 3;
}

message LoginReq {
  string name = 1;
}

message LoginResult {
  UserModel user = 1;
}

enum StatusEnum {
  ACTIVE = 0; // @msg:Active
}

// @controller:/auth
service AuthService {
  rpc Login(LoginReq) returns (LoginResult);
}
"#;

    #[test]
    fn test_host_render_set() {
        let (ctx, schema) = extract(SOURCE);
        let engine = TemplateEngine::builtin(GenerationMode::Host).unwrap();
        let emitter = Emitter::new(&engine, options(GenerationMode::Host));
        let files = emitter.render_schema(&schema, &ctx.registry).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "models/User_gen.go",
                "requests/Login_gen.go",
                "results/Login_gen.go",
                "enums/Status_gen.go",
                "services/Auth_gen.go",
                "controllers/Auth_gen.go",
            ]
        );

        let model = &files[0].content;
        assert!(model.starts_with("// Code generated by protoforge. DO NOT EDIT."));
        assert!(model.contains("\"members\").SetPrimaryKey(\"id\")"));
        assert!(model.contains("Tags []string `json:\"tags\" db:\"tags;type:json;not null;\"`"));
        assert!(model.contains("GetAuthenticatableKey"));

        let result = &files[2].content;
        assert!(result.contains("models \"example.com/app/models\""));
        assert!(result.contains("User *models.UserModel") || result.contains("User models.UserModel"));

        let controller = &files[5].content;
        assert!(controller.contains("svc \"example.com/app/services\""));
        assert!(controller.contains("func AuthServiceRouter(router contracts.HttpRouter)"));
        assert!(controller.contains("service svc.AuthService"));
        assert!(controller.contains("\"example.com/app/response\""));
    }

    #[test]
    fn test_sdk_render_set() {
        let (ctx, schema) = extract(SOURCE);
        let engine = TemplateEngine::builtin(GenerationMode::Sdk).unwrap();
        let emitter = Emitter::new(&engine, options(GenerationMode::Sdk));
        let files = emitter.render_schema(&schema, &ctx.registry).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "models/User_gen.ts",
                "requests/Login_gen.ts",
                "results/Login_gen.ts",
                "enums/Status_gen.ts",
                "controllers/Auth_gen.ts",
            ]
        );
        assert!(files[2]
            .content
            .contains("import type { UserModel } from \"../models/User_gen\";"));
        assert!(files[4].content.contains("login(req: LoginReq): Promise<LoginResult>"));
        assert!(files[4].content.contains("\"POST\", \"/auth\" + \"/Login\""));
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let (ctx, schema) = extract(SOURCE);
        let mut engine = TemplateEngine::empty();
        engine.register_template_string("model", "{{Name}}").unwrap();
        let emitter = Emitter::new(&engine, options(GenerationMode::Host));
        let err = emitter.render_schema(&schema, &ctx.registry).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { ref name } if name == "request"));
    }

    #[test]
    fn test_write_files_creates_directories() {
        let out = tempfile::tempdir().unwrap();
        let files = vec![RenderedFile {
            path: "models/auth/user_gen.go".to_string(),
            template: "model".to_string(),
            content: "package auth\n".to_string(),
        }];
        let written = write_files(out.path(), &files).unwrap();
        assert_eq!(written, vec![out.path().join("models/auth/user_gen.go")]);
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "package auth\n");
        write_files(out.path(), &files).unwrap();
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("models/User_gen.go", "ts"), "models/User_gen.ts");
        assert_eq!(with_extension("models/User_gen.go", "go"), "models/user_gen.go");
    }
}
