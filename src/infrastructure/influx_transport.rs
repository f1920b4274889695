// InfluxDB 2.x transport over the HTTP API
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::transport::{Point, Record, TelemetryTransport};
use crate::error::{Result, TelemetryError};
use crate::infrastructure::config::InfluxSettings;

/// Writes line protocol to `/api/v2/write` and runs Flux through
/// `/api/v2/query`, parsing the CSV response. Timeouts and retries are the
/// HTTP client's business, not this layer's.
#[derive(Debug, Clone)]
pub struct InfluxTransport {
    url: String,
    token: String,
    org: String,
    bucket: String,
    client: reqwest::Client,
}

impl InfluxTransport {
    pub fn new(settings: InfluxSettings) -> Self {
        Self {
            url: settings.url.trim_end_matches('/').to_string(),
            token: settings.token,
            org: settings.org,
            bucket: settings.bucket,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TelemetryTransport for InfluxTransport {
    async fn write_points(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let lines = points
            .iter()
            .map(line_protocol)
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .post(format!("{}/api/v2/write", self.url))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(lines.join("\n"))
            .send()
            .await
            .context("failed to send write request to InfluxDB")?;

        check_status(response).await?;
        Ok(())
    }

    async fn query_records(&self, flux: &str) -> Result<Vec<Record>> {
        let body = serde_json::json!({
            "query": flux,
            "type": "flux",
            "dialect": { "header": true, "delimiter": ",", "annotations": [] },
        });

        let response = self
            .client
            .post(format!("{}/api/v2/query", self.url))
            .query(&[("org", self.org.as_str())])
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/csv")
            .json(&body)
            .send()
            .await
            .context("failed to send query request to InfluxDB")?;

        let response = check_status(response).await?;
        let csv = response
            .text()
            .await
            .context("failed to read query response body")?;

        Ok(parse_record_csv(&csv))
    }
}

/// Map a non-success response: 404 surfaces as `NotFound`, everything else
/// as a transport failure carrying the store's own message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(TelemetryError::NotFound(format!(
            "InfluxDB reported the resource as absent: {body}"
        )));
    }

    Err(anyhow::anyhow!("InfluxDB request failed with status {status}: {body}").into())
}

/// Render one point in line protocol: `measurement,channel=tag value=v ns`.
/// Unsuffixed numeric field values are floats in line protocol.
fn line_protocol(point: &Point) -> Result<String> {
    let ns = point.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        TelemetryError::Validation(format!(
            "timestamp {} is out of range for nanosecond precision",
            point.timestamp
        ))
    })?;

    Ok(format!(
        "{},channel={} value={} {}",
        escape_measurement(&point.measurement),
        escape_tag_value(&point.channel),
        point.value,
        ns,
    ))
}

// Commas and spaces are significant in line protocol measurements.
fn escape_measurement(raw: &str) -> String {
    raw.replace(',', "\\,").replace(' ', "\\ ")
}

// Tag values additionally escape equals signs.
fn escape_tag_value(raw: &str) -> String {
    raw.replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}

struct ColumnIndex {
    time: Option<usize>,
    value: Option<usize>,
    channel: Option<usize>,
}

impl ColumnIndex {
    fn from_header(fields: &[String]) -> Self {
        let position = |name: &str| fields.iter().position(|f| f == name);
        Self {
            time: position("_time"),
            value: position("_value"),
            channel: position("channel"),
        }
    }

    fn record_from_row(&self, fields: &[String]) -> Option<Record> {
        let time = fields.get(self.time?)?;
        let value = fields.get(self.value?)?;

        let timestamp = DateTime::parse_from_rfc3339(time)
            .ok()?
            .with_timezone(&Utc);
        let value: f64 = value.parse().ok()?;
        let channel = self
            .channel
            .and_then(|idx| fields.get(idx))
            .filter(|c| !c.is_empty())
            .cloned();

        Some(Record {
            channel,
            timestamp,
            value,
        })
    }
}

/// Parse a CSV query response into flat records. Result tables are separated
/// by blank lines and each starts with its own header row; only the _time,
/// _value and channel columns are consumed.
fn parse_record_csv(csv: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut columns: Option<ColumnIndex> = None;

    for line in csv.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            columns = None;
            continue;
        }

        let fields = split_csv_line(line);
        match &columns {
            None => columns = Some(ColumnIndex::from_header(&fields)),
            Some(cols) => match cols.record_from_row(&fields) {
                Some(record) => records.push(record),
                None => tracing::warn!("skipping malformed query result row"),
            },
        }
    }

    records
}

/// Minimal CSV field splitter: quoted fields may contain commas, and a
/// doubled quote inside a quoted field is a literal quote.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.is_empty() => quoted = true,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields
}
