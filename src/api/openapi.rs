//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, events, health, merchandise, rentals, roster, sectors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Radiodesk API",
        version = "1.0.0",
        description = "Event radio rentals, merchandise deliveries and attendee roster",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Events
        events::list_events,
        events::current_event,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        events::event_summary,
        // Sectors
        sectors::list_sectors,
        sectors::get_sector,
        sectors::create_sector,
        sectors::update_sector,
        sectors::delete_sector,
        // Rentals
        rentals::list_rentals,
        rentals::overdue_count,
        rentals::get_rental,
        rentals::create_rental,
        rentals::return_rental,
        // Merchandise
        merchandise::list_merchandise,
        merchandise::low_stock,
        merchandise::get_merchandise,
        merchandise::create_merchandise,
        merchandise::update_merchandise,
        merchandise::delete_merchandise,
        merchandise::restock,
        merchandise::list_deliveries,
        merchandise::deliver,
        merchandise::delivery_status,
        merchandise::undo_delivery,
        // Roster
        roster::search,
        roster::get_person,
        roster::create_person,
        roster::update_person,
        roster::delete_person,
        roster::preview_import,
        roster::import,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentKind,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Events and sectors
            crate::models::event::Event,
            crate::models::event::CreateEvent,
            crate::models::event::UpdateEvent,
            crate::models::sector::Sector,
            crate::models::sector::CreateSector,
            crate::models::sector::UpdateSector,
            crate::models::report::EventSummary,
            crate::models::report::SectorSummary,
            crate::models::report::OverdueCount,
            // Rentals
            crate::models::accessories::Accessory,
            crate::models::accessories::AccessorySet,
            crate::models::rental::Rental,
            crate::models::rental::RentalStatus,
            crate::models::rental::DisplayStatus,
            crate::models::rental::RentalView,
            crate::models::rental::CreateRental,
            crate::models::rental::ReturnRental,
            // Merchandise
            crate::models::merchandise::MerchandiseItem,
            crate::models::merchandise::Delivery,
            crate::models::merchandise::CreateMerchandise,
            crate::models::merchandise::UpdateMerchandise,
            crate::models::merchandise::Restock,
            crate::models::merchandise::DeliverRequest,
            crate::models::merchandise::DeliveryReceipt,
            crate::models::merchandise::DeliveryStatus,
            // Roster
            crate::models::enrollee::EnrolledPerson,
            crate::models::enrollee::NewEnrolledPerson,
            crate::models::enrollee::UpdateEnrolledPerson,
            crate::models::enrollee::RosterSearchResponse,
            crate::models::import_report::PreviewRow,
            crate::models::import_report::SkippedRow,
            crate::models::import_report::ImportPreview,
            crate::models::import_report::ImportRequest,
            crate::models::import_report::ImportResult,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Rentable equipment"),
        (name = "events", description = "Events and per-sector reports"),
        (name = "sectors", description = "Sectors equipment is assigned to"),
        (name = "rentals", description = "Equipment checkout and return"),
        (name = "merchandise", description = "Merchandise stock and deliveries"),
        (name = "roster", description = "Enrolled people and bulk import")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
