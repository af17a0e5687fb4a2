//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, aggregating every
//! handler and schema in the web layer.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::events::list_events_handler,
        crate::web::events::create_event_handler,
        crate::web::events::get_event_handler,
        crate::web::events::update_event_handler,
        crate::web::events::delete_event_handler,
        crate::web::events::close_event_handler,
        crate::web::events::export_event_handler,
        crate::web::events::event_stats_handler,
        crate::web::events::categories_handler,
        crate::web::records::add_record_handler,
        crate::web::records::update_record_handler,
        crate::web::records::delete_record_handler,
        crate::web::summary::generate_summary_handler,
        crate::web::summary::export_period_handler,
        crate::web::admin::list_users_handler,
        crate::web::admin::update_role_handler,
        crate::web::admin::delete_user_handler,
    ),
    components(schemas(
        crate::web::auth::SignupRequest,
        crate::web::auth::LoginRequest,
        crate::web::auth::AuthResponse,
        crate::web::events::EventDto,
        crate::web::events::EventRecordDto,
        crate::web::events::EventDetailDto,
        crate::web::events::StatsDto,
        crate::web::events::CreateEventRequest,
        crate::web::events::UpdateEventRequest,
        crate::web::records::AddRecordRequest,
        crate::web::records::UpdateRecordRequest,
        crate::web::summary::SummaryRequest,
        crate::web::summary::SummaryResponse,
        crate::web::admin::ProfileDto,
        crate::web::admin::UpdateRoleRequest,
    )),
    tags(
        (name = "Event Journal API", description = "API endpoints for the event journaling service.")
    )
)]
pub struct ApiDoc;
