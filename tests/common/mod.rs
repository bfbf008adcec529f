#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;

    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temp file with the given extension.
    /// The file is removed when the handle is dropped.
    pub fn create_temp_config(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("inkwell_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_config(content, "yaml")
    }
}

pub mod fixtures {
    use std::sync::Arc;

    use inkwell_routing::dispatcher::{ActionContext, Controller, ControllerResolver};
    use serde_json::{json, Value};

    /// Route configuration shared by the integration tests.
    pub const ROUTES_YAML: &str = r#"
routing:
  mutable: true
  restless: true
  word_separator: "-"
http:
  default_status: 404
routes:
  - base_url: /
    links:
      /users/:id: UsersController::show
      /users:
        action: UsersController::create
        methods: [POST]
      /user_profile/[$:name]: UsersController::profile
      /files/[*:path]: FilesController::show
    handlers:
      404: ErrorController::not_found
    redirects:
      permanent:
        /old: /new
        /legacy/users/:id: /users/:id
      found:
        /away: https://example.com/elsewhere
  - base_url: /admin
    links:
      /: AdminController::index
      /reports/[#:year]: AdminController::report
    handlers:
      404: AdminController::missing
"#;

    pub struct UsersController;

    impl Controller for UsersController {
        fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
            match method {
                "show" => Ok(json!({ "id": ctx.param("id") })),
                "create" => {
                    ctx.response.set_status(201);
                    Ok(json!({ "created": true }))
                }
                "profile" => Ok(json!(format!("profile of {}", ctx.param("name").unwrap_or("?")))),
                other => anyhow::bail!("UsersController has no method '{other}'"),
            }
        }
    }

    pub struct FilesController;

    impl Controller for FilesController {
        fn call(&mut self, _method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
            Ok(json!(ctx.param("path")))
        }
    }

    pub struct ErrorController;

    impl Controller for ErrorController {
        fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
            match method {
                "not_found" => Ok(json!(format!(
                    "{}: nothing at {}",
                    ctx.response.status(),
                    ctx.request.path()
                ))),
                other => anyhow::bail!("ErrorController has no method '{other}'"),
            }
        }
    }

    pub struct AdminController;

    impl Controller for AdminController {
        fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
            match method {
                "index" => Ok(json!("admin home")),
                "report" => Ok(json!({ "year": ctx.param("year") })),
                "missing" => Ok(json!("no such admin page")),
                other => anyhow::bail!("AdminController has no method '{other}'"),
            }
        }
    }

    /// Resolver with every fixture controller registered.
    pub fn resolver() -> Arc<ControllerResolver> {
        let mut resolver = ControllerResolver::new();
        resolver
            .register("UsersController", |_| Ok(Box::new(UsersController)))
            .register("FilesController", |_| Ok(Box::new(FilesController)))
            .register("ErrorController", |_| Ok(Box::new(ErrorController)))
            .register("AdminController", |_| Ok(Box::new(AdminController)));
        Arc::new(resolver)
    }
}
