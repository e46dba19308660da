// api/src/web/routes.rs

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use tracing::debug;

use crate::errors::AppError;
use crate::web::handlers::{
  course_handlers, lesson_handlers, paypal_handlers, quiz_handlers, registration_handlers, review_handlers,
  user_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies, paths and queries answer as validation errors.
fn reject_input(err: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
  debug!(path = %req.path(), error = %err, "Request input rejected.");
  let app_err = AppError::Validation(err.to_string());
  let response = actix_web::ResponseError::error_response(&app_err);
  InternalError::from_response(app_err, response).into()
}

/// Extractor configuration shared by the server and the integration tests.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, req| reject_input(err, req)))
    .app_data(web::PathConfig::default().error_handler(|err, req| reject_input(err, req)))
    .app_data(web::QueryConfig::default().error_handler(|err, req| reject_input(err, req)));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  configure_extractors(cfg);
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/user")
          .route("/register", web::post().to(user_handlers::register_handler))
          .route("/login", web::post().to(user_handlers::login_handler))
          .route("/logout", web::post().to(user_handlers::logout_handler))
          .route("/refresh-token", web::post().to(user_handlers::refresh_token_handler))
          .route("/profile", web::get().to(user_handlers::profile_handler))
          .route("/update", web::put().to(user_handlers::update_profile_handler))
          .route("/updateAvatar", web::put().to(user_handlers::update_avatar_handler))
          .route("/change-password", web::patch().to(user_handlers::change_password_handler))
          .route("/forgot-password/{email}", web::post().to(user_handlers::forgot_password_handler))
          .route(
            "/verify-reset-password-token/{email}",
            web::post().to(user_handlers::verify_reset_code_handler),
          )
          .route("/reset-password", web::patch().to(user_handlers::reset_password_handler))
          .route("/admin/get-all", web::get().to(user_handlers::admin_list_users_handler))
          .route("/admin/create-user", web::post().to(user_handlers::admin_create_user_handler))
          .route("/admin/edit-profile", web::put().to(user_handlers::admin_edit_user_handler))
          .route("/admin/search", web::get().to(user_handlers::admin_search_users_handler))
          .route("/admin/get-total-users", web::get().to(user_handlers::admin_total_users_handler))
          .route("/admin/{userId}", web::delete().to(user_handlers::admin_delete_user_handler)),
      )
      .service(
        web::scope("/course")
          .route("/get-courses", web::get().to(course_handlers::list_courses_handler))
          .route("/detail/url/{urlSlug}", web::get().to(course_handlers::course_by_slug_handler))
          .route("/create-many", web::post().to(course_handlers::create_many_courses_handler))
          .route("/my-courses", web::get().to(course_handlers::my_courses_handler))
          .route("/admin/create", web::post().to(course_handlers::create_course_handler))
          .route("/admin/get-total-courses", web::get().to(course_handlers::total_courses_handler))
          .route("/admin/course/{courseId}", web::get().to(course_handlers::get_course_handler))
          .route(
            "/admin/{courseId}/registered-users",
            web::get().to(course_handlers::registered_users_handler),
          )
          .route("/admin/{courseId}", web::patch().to(course_handlers::update_course_handler))
          .route("/admin/{courseId}", web::delete().to(course_handlers::delete_course_handler)),
      )
      .service(
        web::scope("/lesson")
          .route(
            "/lessons-by-course/{courseId}",
            web::get().to(lesson_handlers::lessons_by_course_handler),
          )
          .route("/admin/create", web::post().to(lesson_handlers::create_lesson_handler))
          .route("/admin/details/{lessonId}", web::get().to(lesson_handlers::lesson_details_handler))
          .route("/admin/update/{lessonId}", web::put().to(lesson_handlers::update_lesson_handler))
          .route("/admin/delete/{lessonId}", web::delete().to(lesson_handlers::delete_lesson_handler)),
      )
      .service(
        web::scope("/quiz")
          .route("/quizzes-by-course/{courseId}", web::get().to(quiz_handlers::quizzes_by_course_handler))
          .route("/admin/create", web::post().to(quiz_handlers::create_quiz_handler))
          .route("/admin/details/{quizId}", web::get().to(quiz_handlers::quiz_details_handler))
          .route("/admin/update/{quizId}", web::put().to(quiz_handlers::update_quiz_handler))
          .route("/admin/delete/{quizId}", web::delete().to(quiz_handlers::delete_quiz_handler)),
      )
      .service(
        web::scope("/course-review")
          .route("/create", web::post().to(review_handlers::create_review_handler))
          .route("/update/{reviewId}", web::put().to(review_handlers::update_review_handler))
          .route("/get-by-course/{courseId}", web::get().to(review_handlers::reviews_by_course_handler))
          .route("/delete/{reviewId}", web::delete().to(review_handlers::delete_review_handler))
          .route("/admin/get-total-reviews", web::get().to(review_handlers::total_reviews_handler)),
      )
      .service(
        web::scope("/register-course")
          .route("/register", web::post().to(registration_handlers::register_course_handler))
          .route(
            "/get-registration/{courseId}",
            web::get().to(registration_handlers::get_registration_handler),
          )
          .route(
            "/admin/registrations",
            web::get().to(registration_handlers::list_registrations_handler),
          )
          .route(
            "/admin/registrations/{registrationId}",
            web::patch().to(registration_handlers::override_registration_handler),
          )
          .route(
            "/admin/get-total-registrations",
            web::get().to(registration_handlers::total_registrations_handler),
          ),
      )
      .service(
        web::scope("/paypal")
          .route("/create-order", web::post().to(paypal_handlers::create_order_handler))
          .route(
            "/capture-order/{registrationId}",
            web::post().to(paypal_handlers::capture_order_handler),
          ),
      ),
  );
}
