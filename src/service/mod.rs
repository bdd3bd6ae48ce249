pub mod coalesce;
pub mod consultations;
pub mod data_store;
pub mod favorites;
pub mod notify;

pub use coalesce::RequestCoalescer;
pub use consultations::ConsultationService;
pub use data_store::{DataStore, ErrorState, LoadingState};
pub use favorites::FavoritesService;
pub use notify::{Notifier, Resource, StoreEvent, Subscription};
