use crate::api::employee::{EmployeeListResponse, MessageResponse};
use crate::model::employee::{Employee, EmployeeInput, EmployeeStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Directory API",
        version = "1.0.0",
        description = r#"
## Employee Directory

List, search, filter, sort, paginate, create, edit, and delete employee records.

### Addressing
Every `/{id}` route accepts either the sequential employee id (`2511980001`)
or the document handle (`_id`, a UUID).

### Errors
Failures answer with `{"message": "..."}`:
- **400** validation failure, including `Email already exists`
- **404** `Employee not found`
- **500** store failure, with the store's message
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
    ),
    components(
        schemas(
            Employee,
            EmployeeInput,
            EmployeeStatus,
            EmployeeListResponse,
            MessageResponse
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;
