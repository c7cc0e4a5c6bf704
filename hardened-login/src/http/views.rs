//! Fixed HTML views and the HTTP shape of gate outcomes.

use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::gate::{HomeOutcome, HomeView, LoginView, RedirectTarget};

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sign in</title>
</head>
<body>
<h1>Sign in</h1>
<form method="post" action="/doLogin">
<label for="username">Username</label>
<input id="username" name="username" type="text" autocomplete="username" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" autocomplete="current-password" required>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#;

const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Home</title>
</head>
<body>
<h1>Welcome</h1>
<p>You are signed in.</p>
</body>
</html>
"#;

impl IntoResponse for RedirectTarget {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(LOCATION, self.location())]).into_response()
    }
}

impl IntoResponse for LoginView {
    fn into_response(self) -> Response {
        Html(LOGIN_PAGE).into_response()
    }
}

impl IntoResponse for HomeView {
    fn into_response(self) -> Response {
        Html(HOME_PAGE).into_response()
    }
}

impl IntoResponse for HomeOutcome {
    fn into_response(self) -> Response {
        match self {
            HomeOutcome::Home(view) => view.into_response(),
            HomeOutcome::Redirect(target) => target.into_response(),
        }
    }
}
