pub mod notification;
pub mod reservation;

pub use notification::{
    ErrorResponse, MarkReadResponse, NotificationResponse, NotificationType, ServiceDescriptor,
    ServiceEndpoints,
};
pub use reservation::ReservationEvent;
