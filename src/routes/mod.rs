pub mod auth;

pub mod users;

pub mod roles;

pub mod courses;

pub mod assignments;

pub mod frontend;

pub use assignments::configure_assignment_routes;
pub use auth::configure_auth_routes;
pub use courses::configure_course_routes;
pub use frontend::configure_frontend_routes;
pub use roles::configure_role_routes;
pub use users::configure_user_routes;
