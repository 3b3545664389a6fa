use crate::di::Injectable;
use crate::meta::ControllerMeta;

/// A routable controller.
///
/// The single `meta()` item is the controller's route table; a type without
/// it simply is not a controller, so the "missing controller metadata" case
/// cannot reach runtime. Construction goes through [`Injectable`], which is
/// where constructor-injected dependencies are declared.
///
/// # Example
/// ```rust,ignore
/// impl Controller for PostController {
///     fn meta() -> ControllerMeta<Self> {
///         ControllerMeta::new("/posts")
///             .middleware(RequestLogger)
///             .route(Route::get("/").handler(Self::index))
///             .route(Route::get("/{id}").param(path_param("id")).handler(Self::show))
///     }
/// }
/// ```
pub trait Controller: Injectable {
    /// Declared once, read once by the binder at startup.
    fn meta() -> ControllerMeta<Self>;

    /// Name used in configuration errors and logs.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
