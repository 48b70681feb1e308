use crate::config::AppConfig;
use crate::services::bookings::BookingService;

pub struct AppState {
    pub config: AppConfig,
    pub bookings: BookingService,
}
