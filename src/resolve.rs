//! Scheme fallback.
//!
//! A target is tried verbatim first. When that fails and the target carries
//! no `http://`/`https://` prefix, `https://` and then `http://` are prepended.
//! Attempts run strictly one after another and the first success wins.

use std::future::Future;

use reqwest::{Client, Response};

use crate::error::{Error, Result};

const HTTPS: &str = "https://";
const HTTP: &str = "http://";

#[derive(Debug)]
pub struct Resolved<T> {
    /// The URL string that produced `value`.
    pub url: String,
    pub value: T,
}

pub fn has_scheme(target: &str) -> bool {
    target.starts_with(HTTPS) || target.starts_with(HTTP)
}

/// Run `attempt` against each variant of `target` until one succeeds.
///
/// When every variant fails, the error of the last attempt is returned.
pub async fn resolve_with<T, E, F, Fut>(
    target: &str,
    mut attempt: F,
) -> std::result::Result<Resolved<T>, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut outcome = try_url(target.to_owned(), &mut attempt).await;
    if has_scheme(target) {
        return outcome;
    }

    for scheme in [HTTPS, HTTP] {
        match outcome {
            Ok(resolved) => return Ok(resolved),
            Err(err) => tracing::debug!(input = target, error = %err, "attempt failed, trying {scheme}"),
        }
        if scheme == HTTP {
            eprintln!("Resorting to http...");
        }
        outcome = try_url(format!("{scheme}{target}"), &mut attempt).await;
    }
    outcome
}

async fn try_url<T, E, F, Fut>(url: String, attempt: &mut F) -> std::result::Result<Resolved<T>, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let value = attempt(url.clone()).await?;
    tracing::debug!(%url, "resolved");
    Ok(Resolved { url, value })
}

/// GET the first working variant of `target`. Non-2xx responses count as failures.
pub async fn resolve(client: &Client, target: &str) -> Result<Resolved<Response>> {
    resolve_with(target, |url| async move {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok::<_, Error>(response)
    })
    .await
}
