//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, home, instances, loans, taxonomy};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = "Library catalog REST API: books, authors, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        home::home,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Genres and languages
        taxonomy::list_genres,
        taxonomy::create_genre,
        taxonomy::list_languages,
        taxonomy::create_language,
        // Instances
        instances::get_instance,
        instances::create_instance,
        instances::update_instance,
        instances::delete_instance,
        // Loans
        loans::my_loans,
        loans::all_loans,
        loans::renewal_form,
        loans::renew_loan,
    ),
    components(
        schemas(
            // Catalog
            crate::models::Author,
            crate::models::AuthorDetail,
            crate::models::AuthorForm,
            crate::models::Book,
            crate::models::BookSummary,
            crate::models::BookDetail,
            crate::models::BookForm,
            crate::models::Genre,
            crate::models::GenreForm,
            crate::models::Language,
            crate::models::LanguageForm,
            crate::models::BookInstance,
            crate::models::InstanceForm,
            crate::models::LoanStatus,
            crate::models::LoanDetails,
            crate::models::Permission,
            crate::models::page::AuthorPage,
            crate::models::page::BookPage,
            crate::models::page::LoanPage,
            // Home
            crate::services::stats::CatalogStats,
            crate::services::stats::HomeView,
            // Loans
            crate::services::loans::RenewalForm,
            loans::RenewalRequest,
            loans::RenewalFormErrors,
            // Redirect bodies
            crate::api::RecordId,
            crate::api::InstanceId,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "home", description = "Catalog statistics and visit counter"),
        (name = "authors", description = "Author records"),
        (name = "books", description = "Book records"),
        (name = "taxonomy", description = "Genres and languages"),
        (name = "instances", description = "Physical copies of books"),
        (name = "loans", description = "Loans and renewals")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
