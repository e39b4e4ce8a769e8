// All service modules
pub mod score_service;
pub mod user_provisioner;

pub use score_service::ScoreService;
pub use user_provisioner::UserProvisioner;
