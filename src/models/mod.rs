//! Data models for Radiodesk

pub mod accessories;
pub mod enrollee;
pub mod equipment;
pub mod event;
pub mod import_report;
pub mod merchandise;
pub mod operator;
pub mod rental;
pub mod report;
pub mod sector;

// Re-export commonly used types
pub use accessories::{Accessory, AccessorySet};
pub use enrollee::{EnrolledPerson, NewEnrolledPerson};
pub use equipment::{Equipment, EquipmentKind};
pub use event::Event;
pub use merchandise::{Delivery, MerchandiseItem};
pub use operator::{Operator, Role};
pub use rental::{DisplayStatus, Rental, RentalStatus, RentalView};
pub use sector::Sector;
