use openapi_from_typescript::{
    collector::RouteCollector, config::GeneratorConfig, openapi_builder::OpenApiBuilder,
    session::ResolutionSession,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn generate(project: &TempDir, schema_type: &str) -> Value {
    let config = GeneratorConfig::from_value(json!({
        "apiDir": project.path().join("src/app/api").to_string_lossy(),
        "schemaDir": project.path().join("src").to_string_lossy(),
        "schemaType": schema_type,
        "info": {"title": "Cross-file API", "version": "1.0.0"}
    }))
    .unwrap();
    let mut session = ResolutionSession::new();
    let routes = RouteCollector::new(&config).collect(&mut session);
    OpenApiBuilder::new(&config).build(&routes, &session)
}

#[test]
fn test_interface_resolved_across_files() {
    let project = create_test_project(vec![
        (
            "src/app/api/users/route.ts",
            "/**\n * List users\n * @response User\n */\nexport async function GET() {}\n",
        ),
        (
            "src/models/user.ts",
            "export interface User { id: number; profile: Profile }",
        ),
        (
            "src/models/profile.ts",
            "export interface Profile { bio: string }",
        ),
    ]);
    let document = generate(&project, "typescript");

    let schemas = document["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("User"));
    assert!(schemas.contains_key("Profile"));
    assert_eq!(
        schemas["User"]["properties"]["profile"],
        json!({"$ref": "#/components/schemas/Profile"})
    );
}

#[test]
fn test_extends_resolved_across_files() {
    let project = create_test_project(vec![
        (
            "src/app/api/admins/route.ts",
            "/**\n * List admins\n * @response Admin\n */\nexport async function GET() {}\n",
        ),
        (
            "src/models/base.ts",
            "export interface Person { id: number; name: string }",
        ),
        (
            "src/models/admin.ts",
            "export interface Admin extends Person { level: number }",
        ),
    ]);
    let document = generate(&project, "typescript");

    let admin = &document["components"]["schemas"]["Admin"];
    let properties = admin["properties"].as_object().unwrap();
    let names: Vec<_> = properties.keys().cloned().collect();
    assert_eq!(names, vec!["id", "name", "level"]);
    assert_eq!(admin["required"], json!(["id", "name", "level"]));
}

#[test]
fn test_builder_schema_resolved_across_files() {
    let project = create_test_project(vec![
        (
            "src/app/api/orders/route.ts",
            "/**\n * Create order\n * @body orderSchema\n */\nexport async function POST() {}\n",
        ),
        (
            "src/schemas/order.ts",
            "export const orderSchema = z.object({ id: z.number(), customer: customerSchema });",
        ),
        (
            "src/schemas/customer.ts",
            "export const customerSchema = z.object({ name: z.string() });",
        ),
    ]);
    let document = generate(&project, "zod");

    let schemas = document["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("orderSchema"));
    assert!(schemas.contains_key("customerSchema"));
    assert_eq!(
        schemas["orderSchema"]["properties"]["customer"],
        json!({"$ref": "#/components/schemas/customerSchema"})
    );
}

#[test]
fn test_mutually_recursive_builder_schemas() {
    let project = create_test_project(vec![
        (
            "src/app/api/tree/route.ts",
            "/**\n * Get tree\n * @response folderSchema\n */\nexport async function GET() {}\n",
        ),
        (
            "src/schemas/folder.ts",
            "export const folderSchema = z.object({ name: z.string(), entries: z.array(z.lazy(() => entrySchema)) });",
        ),
        (
            "src/schemas/entry.ts",
            "export const entrySchema = z.object({ title: z.string(), parent: z.lazy(() => folderSchema).optional() });",
        ),
    ]);
    let document = generate(&project, "zod");

    let schemas = document["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("folderSchema"));
    assert!(schemas.contains_key("entrySchema"));
    assert_eq!(
        schemas["folderSchema"]["properties"]["entries"]["items"],
        json!({"$ref": "#/components/schemas/entrySchema"})
    );
    // the back-reference stays a pointer instead of expanding forever
    assert_eq!(
        schemas["entrySchema"]["properties"]["parent"]["allOf"][0],
        json!({"$ref": "#/components/schemas/folderSchema"})
    );
}

#[test]
fn test_inferred_alias_redirects_to_builder_schema() {
    let project = create_test_project(vec![
        (
            "src/app/api/orders/route.ts",
            "/**\n * Create order\n * @body OrderCreate\n */\nexport async function POST() {}\n",
        ),
        (
            "src/schemas/order.ts",
            "export const orderCreateSchema = z.object({ sku: z.string() });\nexport type OrderCreate = z.infer<typeof orderCreateSchema>;",
        ),
    ]);
    let document = generate(&project, "zod");

    assert_eq!(
        document["paths"]["/orders"]["post"]["requestBody"]["content"]["application/json"]
            ["schema"],
        json!({"$ref": "#/components/schemas/orderCreateSchema"})
    );
    assert!(document["components"]["schemas"]
        .as_object()
        .unwrap()
        .contains_key("orderCreateSchema"));
}
