//! HTTP layer: routes, handlers and range response bodies

pub mod handlers;
pub mod multipart;

use actix_web::web;

use handlers::{
    append_object_handler, delete_object_handler, get_bucket_handler, get_object_handler,
    head_bucket_handler, head_object_handler, object_meta_handler, put_object_handler,
};

/// Register every route of the store on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/buckets/{bucket}", web::head().to(head_bucket_handler))
        .route("/buckets/{bucket}", web::get().to(get_bucket_handler))
        .route("/objects/{bucket}/{key}/meta", web::get().to(object_meta_handler))
        .route("/objects/{bucket}/{key}", web::get().to(get_object_handler))
        .route("/objects/{bucket}/{key}", web::head().to(head_object_handler))
        .route("/objects/{bucket}/{key}", web::put().to(put_object_handler))
        .route("/objects/{bucket}/{key}", web::post().to(append_object_handler))
        .route("/objects/{bucket}/{key}", web::delete().to(delete_object_handler));
}
