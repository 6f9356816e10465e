use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/attachment-types", attachment_type_routes())
        .nest("/content-types", content_type_routes())
        .nest("/libraries", library_routes())
        .nest("/contents", content_routes(config))
        .nest("/files", file_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me, handlers::auth::delete_me))
}

fn attachment_type_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::attachment_type::list_attachment_types,
            handlers::attachment_type::create_attachment_type
        ))
        .routes(routes!(handlers::attachment_type::delete_attachment_type))
}

fn content_type_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::content_type::list_content_types,
            handlers::content_type::create_content_type
        ))
        .routes(routes!(
            handlers::content_type::get_content_type,
            handlers::content_type::delete_content_type
        ))
        .routes(routes!(handlers::content_type::add_feature))
        .routes(routes!(handlers::content_type::remove_feature))
}

fn library_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::library::list_libraries,
            handlers::library::create_library
        ))
        .routes(routes!(handlers::library::delete_library))
}

fn content_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::content::get_content,
            handlers::content::delete_content
        ))
        .routes(routes!(handlers::content::set_features))
        .routes(routes!(handlers::library::reassign_library))
        .routes(routes!(handlers::content::download_content))
        .routes(routes!(handlers::content::download_attachment))
        .routes(routes!(handlers::content::delete_attachment));

    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::content::list_contents,
            handlers::content::create_content
        ))
        .routes(routes!(handlers::content::add_attachment))
        .layer(handlers::content::upload_body_limit(
            config.storage.max_upload_size,
        ));

    crud.merge(upload)
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::files::download_by_path))
}
