//! Report Parser
//!
//! Turns one API report into a pair of linked MISP objects: the observable
//! itself and a `Google-Threat-Intel-report` object holding the assessment.

use crate::client::ReportSource;
use crate::error::Result;
use crate::misp::{MispEvent, MispObject, ANALYZED_WITH, REPORT_OBJECT_NAME};
use crate::report::Report;
use crate::{Attribute, ObservableKind};
use tracing::{debug, info};
use uuid::Uuid;

/// Builds the MISP event for a single enrichment call
pub struct GtiParser<'a, S: ReportSource + ?Sized> {
    source: &'a S,
    /// From `event_limit`; one lookup per call, so only logged
    limit: u32,
    event: MispEvent,
}

impl<'a, S: ReportSource + ?Sized> GtiParser<'a, S> {
    pub fn new(source: &'a S, limit: u32) -> Self {
        Self {
            source,
            limit,
            event: MispEvent::new(),
        }
    }

    /// Look up the attribute and add its objects to the event.
    ///
    /// Returns the uuid of the observable object.
    pub async fn query_api(&mut self, attribute: &Attribute) -> Result<Uuid> {
        let kind = attribute.attribute_type.kind();
        debug!(
            attribute_type = %attribute.attribute_type,
            ?kind,
            limit = self.limit,
            "dispatching lookup"
        );

        let uuid = match kind {
            ObservableKind::Ip => self.parse_ip(&attribute.value).await?,
            ObservableKind::Domain => self.parse_domain(&attribute.value).await?,
            ObservableKind::Hash => self.parse_hash(&attribute.value).await?,
            ObservableKind::Url => self.parse_url(&attribute.value).await?,
        };

        info!(
            attribute_type = %attribute.attribute_type,
            objects = self.event.objects.len(),
            "enrichment complete"
        );
        Ok(uuid)
    }

    pub fn event(&self) -> &MispEvent {
        &self.event
    }

    /// Serialized `Attribute`/`Object` collections of the event
    pub fn results(&self) -> serde_json::Map<String, serde_json::Value> {
        self.event.to_results()
    }

    fn create_report_object(&mut self, report: &Report) -> Uuid {
        let mut object = MispObject::new(REPORT_OBJECT_NAME);
        object.add_attribute("permalink", "link", report.permalink());
        object.add_attribute("Threat Score", "text", report.threat_score());
        object.add_attribute("Verdict", "text", report.verdict());
        object.add_attribute("Severity", "text", report.severity());
        object.add_attribute("Threat Label", "text", report.threat_label());
        self.event.add_object(object)
    }

    /// Link `object` to a fresh report object and add both to the event.
    fn add_with_report(&mut self, mut object: MispObject, report: &Report) -> Uuid {
        let report_uuid = self.create_report_object(report);
        object.add_reference(report_uuid, ANALYZED_WITH);
        self.event.add_object(object)
    }

    async fn parse_domain(&mut self, domain: &str) -> Result<Uuid> {
        let report = self
            .source
            .get_object(&ObservableKind::Domain.api_path(domain))
            .await?;

        let mut object = MispObject::new("domain-ip");
        object.add_attribute("domain", "domain", report.id());
        Ok(self.add_with_report(object, &report))
    }

    async fn parse_hash(&mut self, file_hash: &str) -> Result<Uuid> {
        let report = self
            .source
            .get_object(&ObservableKind::Hash.api_path(file_hash))
            .await?;

        // All three digests come from the one report, whichever was queried.
        let mut object = MispObject::new("file");
        for hash_type in ["md5", "sha1", "sha256"] {
            object.add_optional_attribute(hash_type, hash_type, report.attribute(hash_type));
        }
        Ok(self.add_with_report(object, &report))
    }

    async fn parse_ip(&mut self, ip: &str) -> Result<Uuid> {
        let report = self
            .source
            .get_object(&ObservableKind::Ip.api_path(ip))
            .await?;

        let mut object = MispObject::new("domain-ip");
        object.add_attribute("ip", "ip-dst", report.id());
        Ok(self.add_with_report(object, &report))
    }

    async fn parse_url(&mut self, url: &str) -> Result<Uuid> {
        let report = self
            .source
            .get_object(&ObservableKind::Url.api_path(url))
            .await?;

        let mut object = MispObject::new("url");
        object.add_optional_attribute("url", "url", report.attribute("url"));
        Ok(self.add_with_report(object, &report))
    }
}
