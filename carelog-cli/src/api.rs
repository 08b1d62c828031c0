//! Where reminder instances come from: the REST backend or a JSON snapshot.

use anyhow::{Context, Result, bail};
use carelog_core::{Appointment, PatchInstance, RawInstance};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::config::ApiSection;
use crate::state;

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    page_limit: u32,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(section: &ApiSection) -> Self {
        Self {
            base_url: section.base_url.trim_end_matches('/').to_string(),
            page_limit: section.page_limit,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, u32)]) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("backend error on GET {url}: {status} {txt}");
        }
        resp.json().await.with_context(|| format!("parse response of GET {url}"))
    }

    /// Every instance, walking `skip` one page at a time until a short page.
    pub async fn instances(&self) -> Result<Vec<RawInstance>> {
        let limit = self.page_limit.max(1);
        let mut out = Vec::new();
        let mut skip = 0;
        loop {
            let page: Vec<RawInstance> = self
                .get_json(
                    "/reminder-instances/with-medicine",
                    &[("skip", skip), ("limit", limit)],
                )
                .await?;
            let len = page.len();
            out.extend(page);
            if len < limit as usize {
                break;
            }
            skip += limit;
        }
        tracing::debug!(count = out.len(), "loaded all instances");
        Ok(out)
    }

    /// One instance by id, `None` on 404.
    pub async fn instance(&self, id: i64) -> Result<Option<RawInstance>> {
        let url = self.url(&format!("/reminder-instances/{id}"));
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("backend error on GET {url}: {status} {txt}");
        }
        let raw = resp
            .json()
            .await
            .with_context(|| format!("parse response of GET {url}"))?;
        Ok(Some(raw))
    }

    pub async fn today_instances(&self) -> Result<Vec<RawInstance>> {
        self.get_json("/reminder-instances/today/with-medicine", &[]).await
    }

    pub async fn month_instances(&self, year: i32, month: u32) -> Result<Vec<RawInstance>> {
        self.get_json(
            &format!("/reminder-instances/month/{year}/{month}/with-medicine"),
            &[],
        )
        .await
    }

    pub async fn appointments(&self) -> Result<Vec<Appointment>> {
        self.get_json("/appointments/", &[("skip", 0), ("limit", self.page_limit)])
            .await
    }

    pub async fn patch_instance(&self, id: i64, body: &PatchInstance) -> Result<()> {
        let url = self.url(&format!("/reminder-instances/{id}"));
        tracing::debug!(%url, status = %body.status, "PATCH");
        let resp = self
            .http
            .patch(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PATCH {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("backend error on PATCH {url}: {status} {txt}");
        }
        Ok(())
    }
}

/// Instance source chosen on the command line.
#[derive(Debug, Clone)]
pub enum Source {
    Api(ApiClient),
    File {
        instances: PathBuf,
        appointments: Option<PathBuf>,
    },
}

impl Source {
    pub async fn all(&self) -> Result<Vec<RawInstance>> {
        match self {
            Source::Api(api) => api.instances().await,
            Source::File { instances, .. } => state::read_snapshot(instances),
        }
    }

    /// One instance by id, `None` if the source does not have it.
    pub async fn one(&self, id: i64) -> Result<Option<RawInstance>> {
        match self {
            Source::Api(api) => api.instance(id).await,
            Source::File { instances, .. } => {
                Ok(state::read_snapshot(instances)?.into_iter().find(|r| r.id == id))
            }
        }
    }

    /// Current records for `ids`, skipping ids the source no longer has.
    pub async fn many(&self, ids: &[i64]) -> Result<Vec<RawInstance>> {
        match self {
            Source::Api(api) => {
                let results = join_all(ids.iter().map(|id| api.instance(*id))).await;
                let mut out = Vec::with_capacity(ids.len());
                for found in results {
                    out.extend(found?);
                }
                Ok(out)
            }
            Source::File { instances, .. } => Ok(state::read_snapshot(instances)?
                .into_iter()
                .filter(|r| ids.contains(&r.id))
                .collect()),
        }
    }

    /// Candidates for today; callers still filter with their own clock.
    pub async fn today(&self) -> Result<Vec<RawInstance>> {
        match self {
            Source::Api(api) => api.today_instances().await,
            Source::File { .. } => self.all().await,
        }
    }

    pub async fn month(&self, year: i32, month: u32) -> Result<Vec<RawInstance>> {
        match self {
            Source::Api(api) => api.month_instances(year, month).await,
            Source::File { .. } => self.all().await,
        }
    }

    pub async fn appointments(&self) -> Result<Vec<Appointment>> {
        match self {
            Source::Api(api) => api.appointments().await,
            Source::File {
                appointments: Some(path),
                ..
            } => state::read_appointments(path),
            Source::File { .. } => Ok(Vec::new()),
        }
    }

    /// Send every patch. Backend patches go out concurrently; a snapshot
    /// file is rewritten once.
    pub async fn patch_many(&self, patches: &[(i64, PatchInstance)]) -> Result<()> {
        match self {
            Source::Api(api) => {
                let results =
                    join_all(patches.iter().map(|(id, body)| api.patch_instance(*id, body))).await;
                let failures: Vec<String> = results
                    .into_iter()
                    .filter_map(|r| r.err())
                    .map(|e| format!("{e:#}"))
                    .collect();
                if !failures.is_empty() {
                    bail!(
                        "{} of {} updates failed:\n{}",
                        failures.len(),
                        patches.len(),
                        failures.join("\n")
                    );
                }
                Ok(())
            }
            Source::File { instances, .. } => {
                let mut raws = state::read_snapshot(instances)?;
                for (id, body) in patches {
                    let Some(raw) = raws.iter_mut().find(|r| r.id == *id) else {
                        bail!("instance {id} not found in {}", instances.display());
                    };
                    raw.status = Some(body.status.as_str().to_string());
                    raw.taken_at = body.taken_at.clone();
                }
                state::write_snapshot(instances, &raws)
            }
        }
    }
}
