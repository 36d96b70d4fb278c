use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::model::employee::{Employee, EmployeeInput};
use crate::store::query::{EmployeeQuery, SortField, SortOrder};
use crate::store::{EmployeeLookup, EmployeeStore};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Employee not found")]
    pub message: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number, starting at 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page (1-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Case-insensitive match on name or email; a number also matches the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    /// Field to sort by, e.g. `createdAt`, `name`, `salary`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// `desc` for descending, anything else ascending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListParams {
    pub fn into_query(self) -> Result<EmployeeQuery, ApiError> {
        let defaults = EmployeeQuery::default();

        let (sort, order) = match non_empty(self.sort) {
            Some(field) => {
                let sort = field
                    .parse::<SortField>()
                    .map_err(|_| ApiError::validation(format!("Invalid sort field: {field}")))?;
                (sort, SortOrder::from_param(self.order.as_deref()))
            }
            None => (defaults.sort, defaults.order),
        };

        Ok(EmployeeQuery {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(EmployeeQuery::DEFAULT_LIMIT)
                .clamp(1, EmployeeQuery::MAX_LIMIT),
            search: non_empty(self.search),
            department: non_empty(self.department),
            designation: non_empty(self.designation),
            sort,
            order,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListResponse {
    pub employees: Vec<Employee>,
    #[schema(example = 3)]
    pub total_pages: u64,
    #[schema(example = 1)]
    pub current_page: u32,
    #[schema(example = 27)]
    pub total_employees: u64,
}

fn resolve(raw: &str) -> Result<EmployeeLookup, ApiError> {
    EmployeeLookup::parse(raw).ok_or(ApiError::NotFound)
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 400, description = "Invalid query", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    tag = "Employee"
)]
#[instrument(name = "list_employees", skip(store))]
pub async fn list_employees(
    store: web::Data<dyn EmployeeStore>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    let query = params.into_inner().into_query()?;
    let page = store.list(&query).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total_pages: query.total_pages(page.total),
        current_page: query.page,
        total_employees: page.total,
        employees: page.employees,
    }))
}

/// Get Employee
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Sequential id or document handle")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let lookup = resolve(&path)?;
    let employee = store.find(&lookup).await?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed or email already exists", body = MessageResponse,
            example = json!({ "message": "Email already exists" })),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    tag = "Employee"
)]
#[instrument(name = "create_employee", skip(store, payload))]
pub async fn create_employee(
    store: web::Data<dyn EmployeeStore>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ApiError> {
    let fields = payload.into_inner().into_new()?;

    // Racy by nature; the unique index turns a lost race into the same error.
    if store.find_by_email(&fields.email).await?.is_some() {
        debug!("Rejected duplicate email");
        return Err(ApiError::duplicate_email());
    }

    let employee = store.insert(fields).await?;
    info!(id = employee.id, handle = %employee.handle, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Sequential id or document handle")
    ),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed or email already exists", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    tag = "Employee"
)]
#[instrument(name = "update_employee", skip(store, payload))]
pub async fn update_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<String>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ApiError> {
    let lookup = resolve(&path)?;
    let existing = store.find(&lookup).await?.ok_or(ApiError::NotFound)?;
    let fields = payload.into_inner().apply_to(&existing)?;

    if fields.email != existing.email {
        if let Some(other) = store.find_by_email(&fields.email).await? {
            if other.handle != existing.handle {
                return Err(ApiError::duplicate_email());
            }
        }
    }

    let employee = store
        .update(existing.handle, fields)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(id = employee.id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Sequential id or document handle")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse,
            example = json!({ "message": "Employee deleted successfully" })),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    tag = "Employee"
)]
#[instrument(name = "delete_employee", skip(store))]
pub async fn delete_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let lookup = resolve(&path)?;
    if !store.delete(&lookup).await? {
        return Err(ApiError::NotFound);
    }

    info!(?lookup, "Employee deleted");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Employee deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes;
    use crate::store::memory::MemoryStore;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web::Data};
    use serde_json::{Value, json};
    use std::sync::Arc;

    macro_rules! test_app {
        () => {{
            let store: Arc<dyn EmployeeStore> = Arc::new(MemoryStore::default());
            test::init_service(
                App::new()
                    .app_data(Data::from(store))
                    .app_data(routes::json_config())
                    .app_data(routes::query_config())
                    .service(web::scope("/api/employees").configure(routes::employee_routes)),
            )
            .await
        }};
    }

    fn body(name: &str, email: &str, department: &str, salary: f64) -> Value {
        json!({
            "name": name,
            "email": email,
            "department": department,
            "designation": "Software Engineer",
            "salary": salary,
            "joining_date": "2024-02-01"
        })
    }

    macro_rules! create {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/employees")
                .set_json($body)
                .to_request();
            test::call_service(&$app, req).await
        }};
    }

    macro_rules! get {
        ($app:expr, $uri:expr) => {{
            let req = test::TestRequest::get().uri($uri).to_request();
            test::call_service(&$app, req).await
        }};
    }

    #[actix_web::test]
    async fn create_assigns_increasing_ids() {
        let app = test_app!();

        let mut last = 0;
        for i in 0..3 {
            let resp = create!(app, body("Ann", &format!("ann{i}@example.com"), "HR", 100.0));
            assert_eq!(resp.status(), StatusCode::CREATED);
            let employee: Employee = test::read_body_json(resp).await;
            assert!(employee.id > last);
            last = employee.id;
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let app = test_app!();

        let resp = create!(app, body("Ann", "ann@example.com", "HR", 100.0));
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = create!(app, body("Other Ann", " ANN@Example.com ", "Sales", 90.0));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json, json!({ "message": "Email already exists" }));
    }

    #[actix_web::test]
    async fn missing_fields_fail_validation() {
        let app = test_app!();

        let resp = create!(app, json!({ "email": "x@example.com" }));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Name is required");
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = test::read_body_json(resp).await;
        assert!(json["message"].is_string());
    }

    #[actix_web::test]
    async fn create_then_fetch_round_trips() {
        let app = test_app!();

        let resp = create!(app, body("  Bea Cruz ", "Bea.Cruz@Example.com", "Finance", 5400.5));
        let created: Employee = test::read_body_json(resp).await;
        assert_eq!(created.email, "bea.cruz@example.com");
        assert_eq!(created.name, "Bea Cruz");

        let by_id: Employee =
            test::read_body_json(get!(app, &format!("/api/employees/{}", created.id))).await;
        let by_handle: Employee =
            test::read_body_json(get!(app, &format!("/api/employees/{}", created.handle))).await;

        assert_eq!(by_id, created);
        assert_eq!(by_handle, created);
    }

    #[actix_web::test]
    async fn unknown_ids_are_not_found() {
        let app = test_app!();

        for uri in ["/api/employees/999", "/api/employees/not-an-id"] {
            let resp = get!(app, uri);
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let json: Value = test::read_body_json(resp).await;
            assert_eq!(json, json!({ "message": "Employee not found" }));
        }
    }

    #[actix_web::test]
    async fn delete_is_permanent_and_missing_ids_are_not_found() {
        let app = test_app!();
        let created: Employee =
            test::read_body_json(create!(app, body("Cy", "cy@example.com", "HR", 1.0))).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/employees/{}", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Employee deleted successfully");

        assert_eq!(
            get!(app, &format!("/api/employees/{}", created.id)).status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::delete()
            .uri(&format!("/api/employees/{}", created.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn update_replaces_provided_fields_and_revalidates() {
        let app = test_app!();
        let ann: Employee =
            test::read_body_json(create!(app, body("Ann", "ann@example.com", "HR", 100.0))).await;
        create!(app, body("Bob", "bob@example.com", "HR", 100.0));

        let put = |payload: Value| {
            test::TestRequest::put()
                .uri(&format!("/api/employees/{}", ann.handle))
                .set_json(payload)
                .to_request()
        };

        let resp = test::call_service(&app, put(json!({ "salary": -5 }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, put(json!({ "email": "BOB@example.com" }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Email already exists");

        let resp = test::call_service(
            &app,
            put(json!({ "designation": "Manager", "salary": "250", "id": 7 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Employee = test::read_body_json(resp).await;
        assert_eq!(updated.id, ann.id);
        assert_eq!(updated.designation, "Manager");
        assert_eq!(updated.salary, 250.0);
        assert_eq!(updated.email, ann.email);
        assert_eq!(updated.created_at, ann.created_at);
        assert!(updated.updated_at >= ann.updated_at);

        let req = test::TestRequest::put()
            .uri("/api/employees/424242")
            .set_json(json!({ "name": "Nobody" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn department_filter_returns_only_matches() {
        let app = test_app!();
        create!(app, body("Ann", "ann@example.com", "HR", 100.0));
        create!(app, body("Bob", "bob@example.com", "Sales", 100.0));
        create!(app, body("Cy", "cy@example.com", "HR", 100.0));

        let list: EmployeeListResponse =
            test::read_body_json(get!(app, "/api/employees?department=HR")).await;

        assert_eq!(list.total_employees, 2);
        assert!(list.employees.iter().all(|e| e.department == "HR"));
    }

    #[actix_web::test]
    async fn list_paginates_newest_first_by_default() {
        let app = test_app!();
        for i in 0..15 {
            create!(app, body("Emp", &format!("e{i}@example.com"), "HR", 100.0));
        }

        let list: EmployeeListResponse =
            test::read_body_json(get!(app, "/api/employees?page=2&limit=10")).await;

        assert_eq!(list.total_employees, 15);
        assert_eq!(list.total_pages, 2);
        assert_eq!(list.current_page, 2);
        assert_eq!(list.employees.len(), 5);
        // ties on createdAt fall back to id, newest first
        let ids: Vec<u64> = list.employees.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    }

    #[actix_web::test]
    async fn search_sort_and_envelope() {
        let app = test_app!();
        create!(app, body("Zed", "zed@example.com", "HR", 300.0));
        create!(app, body("Amy", "amy@corp.io", "HR", 100.0));
        create!(app, body("Max", "max@example.com", "HR", 200.0));

        let resp = get!(app, "/api/employees?search=EXAMPLE&sort=salary&order=asc");
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["totalEmployees"], 2);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["employees"][0]["name"], "Max");
        assert_eq!(json["employees"][1]["name"], "Zed");

        let list: EmployeeListResponse =
            test::read_body_json(get!(app, "/api/employees?search=2")).await;
        assert_eq!(list.employees.len(), 1);
        assert_eq!(list.employees[0].name, "Amy");

        let resp = get!(app, "/api/employees?sort=password");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn list_params_clamp_and_default() {
        let query = ListParams {
            page: Some(0),
            limit: Some(1000),
            search: Some("  ".to_string()),
            order: Some("desc".to_string()),
            ..ListParams::default()
        }
        .into_query()
        .unwrap();

        assert_eq!(query.page, 1);
        assert_eq!(query.limit, EmployeeQuery::MAX_LIMIT);
        assert_eq!(query.search, None);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
    }
}
