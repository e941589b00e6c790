use rocket::State;
use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::{Instrument, info};

use crate::db::{
    get_user, insert_user, insert_visited_country, list_country_positions, list_users,
    list_visited_countries, resolve_country_code,
};
use crate::error::AppError;
use crate::models::{Dashboard, User};
use crate::session::CurrentUser;
use crate::telemetry::RequestSpan;

pub const COUNTRY_NOT_FOUND: &str =
    "Country doesn't exist. Please enter a valid country name and try again.";
pub const COUNTRY_ALREADY_ADDED: &str = "Country already inserted. Try again.";
pub const USER_ALREADY_EXISTS: &str = "User already exist. Try again.";

#[derive(Responder)]
pub enum PageResponse {
    Redirect(Redirect),
    Page(Template),
}

fn new_user_page(error: Option<&str>) -> Template {
    Template::render(
        "new",
        context! {
            title: "Add Family Member",
            error: error,
        },
    )
}

async fn dashboard(
    pool: &Pool<Sqlite>,
    user: &User,
    error: Option<&str>,
) -> Result<Template, AppError> {
    let countries = list_visited_countries(pool, user.id).await?;
    let users = list_users(pool).await?;
    let positions = list_country_positions(pool).await?;

    Ok(Template::render(
        "index",
        Dashboard::new(user, countries, users, positions, error),
    ))
}

/// The home page for `user_id`: their map if they exist, the new user form otherwise.
async fn current_page(
    pool: &Pool<Sqlite>,
    user_id: i64,
    error: Option<&str>,
) -> Result<Template, AppError> {
    match get_user(pool, user_id).await? {
        Some(user) => dashboard(pool, &user, error).await,
        None => Ok(new_user_page(error)),
    }
}

#[get("/")]
pub async fn home(
    db: &State<Pool<Sqlite>>,
    current: CurrentUser,
    span: RequestSpan,
) -> Result<Template, AppError> {
    current_page(db, current.id(), None).instrument(span.0).await
}

impl PageResponse {
    fn home() -> Self {
        PageResponse::Redirect(Redirect::to(uri!(home)))
    }
}

#[derive(FromForm)]
pub struct AddCountryForm {
    country: String,
}

#[post("/add", data = "<form>")]
pub async fn add_country(
    db: &State<Pool<Sqlite>>,
    current: CurrentUser,
    span: RequestSpan,
    form: Form<AddCountryForm>,
) -> Result<PageResponse, AppError> {
    record_visit(db, current.id(), &form.country)
        .instrument(span.0)
        .await
}

async fn record_visit(
    pool: &Pool<Sqlite>,
    user_id: i64,
    country: &str,
) -> Result<PageResponse, AppError> {
    let Some(country_code) = resolve_country_code(pool, country).await? else {
        AppError::InvalidInput(format!("No country named '{}'", country))
            .log_and_record("Adding visited country");
        let page = current_page(pool, user_id, Some(COUNTRY_NOT_FOUND)).await?;
        return Ok(PageResponse::Page(page));
    };

    match insert_visited_country(pool, &country_code, user_id).await {
        Ok(id) => {
            info!(id, country_code = %country_code, user_id, "Visited country recorded");
            Ok(PageResponse::home())
        }
        Err(err @ AppError::Duplicate(_)) => {
            err.log_and_record("Adding visited country");
            let page = current_page(pool, user_id, Some(COUNTRY_ALREADY_ADDED)).await?;
            Ok(PageResponse::Page(page))
        }
        Err(err) => Err(err),
    }
}

#[derive(FromForm)]
pub struct SwitchUserForm {
    user: Option<i64>,
}

#[post("/user", data = "<form>")]
pub fn switch_user(form: Form<SwitchUserForm>, cookies: &CookieJar<'_>) -> PageResponse {
    match form.user {
        Some(user_id) => {
            CurrentUser::switch_to(cookies, user_id);
            PageResponse::home()
        }
        None => PageResponse::Page(new_user_page(None)),
    }
}

#[derive(FromForm)]
pub struct NewUserForm {
    name: String,
    color: String,
}

#[post("/new", data = "<form>")]
pub async fn new_user(
    db: &State<Pool<Sqlite>>,
    current: CurrentUser,
    span: RequestSpan,
    form: Form<NewUserForm>,
) -> Result<PageResponse, AppError> {
    create_user(db, current.id(), &form.name, &form.color)
        .instrument(span.0)
        .await
}

async fn create_user(
    pool: &Pool<Sqlite>,
    current_user_id: i64,
    name: &str,
    color: &str,
) -> Result<PageResponse, AppError> {
    match insert_user(pool, name, color).await {
        Ok(id) => {
            info!(id, name = %name, "User created");
            Ok(PageResponse::home())
        }
        // The active user is not switched, so this shows whoever was active before.
        Err(err @ AppError::Duplicate(_)) => {
            err.log_and_record("Creating user");
            let page = current_page(pool, current_user_id, Some(USER_ALREADY_EXISTS)).await?;
            Ok(PageResponse::Page(page))
        }
        Err(err) => Err(err),
    }
}

#[catch(404)]
pub fn not_found() -> &'static str {
    "Not Found"
}

#[catch(422)]
pub fn unprocessable() -> &'static str {
    "Invalid form submission"
}

#[catch(500)]
pub fn server_error() -> &'static str {
    "Server Error"
}
