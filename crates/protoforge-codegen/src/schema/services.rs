//! Service and controller extraction.

use super::extract::OutputPaths;
use super::{Method, SchemaContext, Service, ServiceGroup, TypeRef};
use crate::directive::{Directive, DirectiveBlock, as_line_comments};
use crate::naming::{join_path, trim_suffixes};
use protoforge_idl::{ProtoFile, Rpc};

const DEFAULT_HTTP_METHOD: &str = "Post";

impl ServiceGroup {
    /// Group of a service by name suffix, `None` for any other name.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        if name.ends_with(Self::Services.suffix()) {
            Some(Self::Services)
        } else if name.ends_with(Self::Controllers.suffix()) {
            Some(Self::Controllers)
        } else {
            None
        }
    }
}

impl SchemaContext {
    /// Splits the services of `file` into `(services, controllers)`.
    pub(super) fn build_services(
        &self,
        file: &ProtoFile,
        dir: &str,
    ) -> (Vec<Service>, Vec<Service>) {
        let mut services = Vec::new();
        let mut controllers = Vec::new();
        for decl in file.services() {
            let Some(group) = ServiceGroup::classify(&decl.name) else {
                tracing::warn!(
                    "Service {} ends in neither Service nor Controller; skipped",
                    decl.name
                );
                continue;
            };
            let service = self.build_service(decl, group, dir);
            match group {
                ServiceGroup::Services => services.push(service),
                ServiceGroup::Controllers => controllers.push(service),
            }
        }
        (services, controllers)
    }

    fn build_service(
        &self,
        decl: &protoforge_idl::Service,
        group: ServiceGroup,
        dir: &str,
    ) -> Service {
        let block = DirectiveBlock::from_comments(&decl.comments);
        let raw_name = {
            let trimmed = trim_suffixes(&decl.name, &[group.suffix()]);
            if trimmed.is_empty() { decl.name.as_str() } else { trimmed }.to_string()
        };
        let paths = OutputPaths::new(&self.base_package, group.dir(), dir, &raw_name);

        let mut controller_directive = None;
        let mut middlewares = Vec::new();
        for directive in block.directives() {
            match directive {
                Directive::Controller(prefix) => {
                    controller_directive.get_or_insert(prefix.unwrap_or_default());
                }
                Directive::Middleware(name) => middlewares.push(name),
                _ => {}
            }
        }

        let is_controller =
            group == ServiceGroup::Controllers || controller_directive.is_some();
        let controller_file_path = (group == ServiceGroup::Services && is_controller).then(|| {
            join_path(&[
                ServiceGroup::Controllers.dir(),
                dir,
                &format!("{raw_name}_gen.go"),
            ])
        });

        Service {
            name: decl.name.clone(),
            group,
            methods: decl.rpcs.iter().map(|rpc| self.build_method(rpc)).collect(),
            is_controller,
            prefix: controller_directive.unwrap_or_default(),
            middlewares,
            display_name: format!("{}.{}", paths.package, decl.name),
            import_path: paths.import_path,
            package_name: paths.package,
            file_path: paths.file_path,
            controller_file_path,
            controller_import_path: join_path(&[
                &self.base_package,
                ServiceGroup::Controllers.dir(),
                dir,
            ]),
            template: group.template().to_string(),
            comments: as_line_comments(block.doc_lines()),
            raw_name,
        }
    }

    fn build_method(&self, rpc: &Rpc) -> Method {
        let block = DirectiveBlock::from_comments(&rpc.comments);
        let mut http_methods = Vec::new();
        let mut path = None;
        let mut middlewares = Vec::new();
        for directive in block.directives() {
            match directive {
                Directive::Method(verbs) if http_methods.is_empty() => http_methods = verbs,
                Directive::Path(route) => {
                    path.get_or_insert(route);
                }
                Directive::Middleware(name) => middlewares.push(name),
                _ => {}
            }
        }
        if http_methods.is_empty() {
            http_methods.push(DEFAULT_HTTP_METHOD.to_string());
        }

        Method {
            path: path.unwrap_or_else(|| format!("/{}", rpc.name)),
            name: rpc.name.clone(),
            input: TypeRef::resolve(&rpc.request_type, rpc.request_stream, &self.registry),
            output: TypeRef::resolve(&rpc.returns_type, rpc.returns_stream, &self.registry),
            http_methods,
            middlewares,
            comments: as_line_comments(block.doc_lines()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services_of(source: &str) -> (Vec<Service>, Vec<Service>) {
        let file = protoforge_idl::parse_str(source).unwrap();
        SchemaContext::new("example.com/app", ".").build_services(&file, "auth")
    }

    #[test]
    fn test_classify() {
        assert_eq!(ServiceGroup::classify("AuthService"), Some(ServiceGroup::Services));
        assert_eq!(
            ServiceGroup::classify("UserController"),
            Some(ServiceGroup::Controllers)
        );
        assert_eq!(ServiceGroup::classify("Gateway"), None);
    }

    #[test]
    fn test_method_defaults() {
        let (services, controllers) = services_of(
            "syntax = \"proto3\";\nservice AuthService {\n  rpc Login(LoginReq) returns (LoginResult);\n}",
        );
        assert!(controllers.is_empty());
        let service = &services[0];
        assert_eq!(service.raw_name, "Auth");
        assert_eq!(service.file_path, "services/auth/Auth_gen.go");
        assert_eq!(service.import_path, "example.com/app/services/auth");
        assert!(!service.is_controller);
        let login = &service.methods[0];
        assert_eq!(login.http_methods, vec!["Post"]);
        assert_eq!(login.path, "/Login");
        assert_eq!(login.input.import_path, None);
        assert_eq!(login.input.display, "LoginReq");
    }

    #[test]
    fn test_method_directives() {
        let (services, _) = services_of(
            r#"syntax = "proto3";
// @middleware:auth
// @controller:/v1/auth
service AuthService {
  // @method:Get,Post
  // @path:/profile
  // @middleware:throttle
  // @middleware:audit
  // Returns the current profile
  rpc Profile(ProfileReq) returns (stream ProfileResult);
}"#,
        );
        let service = &services[0];
        assert!(service.is_controller);
        assert_eq!(service.prefix, "/v1/auth");
        assert_eq!(service.middlewares, vec!["auth"]);
        assert_eq!(
            service.controller_file_path.as_deref(),
            Some("controllers/auth/Auth_gen.go")
        );
        assert_eq!(
            service.router_call("router"),
            "auth.AuthServiceRouter(router)"
        );
        let method = &service.methods[0];
        assert_eq!(method.http_methods, vec!["Get", "Post"]);
        assert_eq!(method.path, "/profile");
        assert_eq!(method.middlewares, vec!["throttle", "audit"]);
        assert!(method.output.stream);
        assert_eq!(method.comments, vec!["// Returns the current profile"]);
    }

    #[test]
    fn test_controller_group() {
        let (services, controllers) = services_of(
            "syntax = \"proto3\";\nservice UserController {}\nservice Gateway {}",
        );
        assert!(services.is_empty());
        assert_eq!(controllers.len(), 1);
        assert!(controllers[0].is_controller);
        assert_eq!(controllers[0].template, "controller");
        assert_eq!(controllers[0].file_path, "controllers/auth/User_gen.go");
        assert_eq!(controllers[0].controller_file_path, None);
    }
}
