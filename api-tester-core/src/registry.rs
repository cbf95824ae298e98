//! Endpoint registry: the fixed operation catalog and path templating.
//!
//! Templates use `{name}` placeholders. Resolution substitutes every
//! placeholder found in the parameter map and leaves the others in place,
//! braces included, so that optional or path-only parameters pass through
//! untouched instead of failing the call.

use regex::{Captures, Regex};
use serde_json::json;
use std::sync::OnceLock;

use crate::error::{ConsoleError, Result};
use crate::models::{HttpMethod, OperationDescriptor, ParameterMap, SampleInvocation};

const SCREENING_ID: &str = "40bdc96e-3a2a-451c-91db-bd85278e33cd";
const MONITORED_SCREENING_ID: &str = "517b2242-2f48-4a06-ab36-5694a4066cee";
const DOCUMENT_ID: &str = "3b984512-42e9-4007-a334-0e97c3cf3a63";
const FOOTPRINT_ID: &str = "38403223-7bed-4e5f-a339-bd1cb96931c4";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is a valid regex"))
}

/// Substitute `{key}` occurrences in `template` from `params`.
///
/// Pure: the output depends only on the inputs. Repeated placeholders all
/// receive the same value; keys missing from `params` stay literal.
pub fn resolve(template: &str, params: &ParameterMap) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names in the order they appear in `template`
pub fn placeholder_names(template: &str) -> Vec<String> {
    placeholder_pattern()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Ordered, immutable collection of operation descriptors.
/// Descriptor ids equal their position.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    operations: Vec<OperationDescriptor>,
}

impl EndpointRegistry {
    /// Build a registry from `(template, method, label, sample)` entries,
    /// assigning ids by position.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, HttpMethod, String, SampleInvocation)>,
    {
        let operations = entries
            .into_iter()
            .enumerate()
            .map(|(id, (path_template, default_method, label, sample))| OperationDescriptor {
                id,
                path_template,
                default_method,
                label,
                sample,
            })
            .collect();

        Self { operations }
    }

    /// The Regulon public API catalog exposed by the console
    pub fn regulon() -> Self {
        let screening = || ParameterMap::new().with("individual_screening_id", SCREENING_ID);

        let entries = vec![
            entry(
                "/screenings",
                HttpMethod::Post,
                "Start bulk Anti-Money Laundering screening of individuals",
                Some(json!({
                    "individuals": [{
                        "full_name": "John Doe",
                        "nationality": "American",
                        "date_of_birth": "2019-08-24",
                        "gender": "male"
                    }]
                })),
                ParameterMap::new(),
            ),
            entry(
                "/screenings/status/{individual_screening_id}",
                HttpMethod::Get,
                "Fetch status of Anti-Money Laundering screening",
                None,
                screening(),
            ),
            entry(
                "/screenings/peps/{individual_screening_id}",
                HttpMethod::Get,
                "Fetch Political data of individual",
                None,
                screening(),
            ),
            entry(
                "/screenings/adverse_medias/{individual_screening_id}",
                HttpMethod::Get,
                "Fetch Adverse Media data of individual",
                None,
                screening(),
            ),
            entry(
                "/screenings/sanctions/{individual_screening_id}",
                HttpMethod::Get,
                "Fetch sanctions data of an individual",
                None,
                screening(),
            ),
            entry(
                "/screenings/{individual_screening_id}/monitoring",
                HttpMethod::Patch,
                "Update monitoring status of a screened individual",
                Some(json!({ "monitoring": true })),
                ParameterMap::new().with("individual_screening_id", MONITORED_SCREENING_ID),
            ),
            entry(
                "/companies/search?company_name={companyName}&country={country}&page_number={pageNumber}&per_page={perPage}",
                HttpMethod::Get,
                "Search for company by name",
                None,
                ParameterMap::new()
                    .with("companyName", "Pepsi")
                    .with("country", "uk")
                    .with("pageNumber", 1)
                    .with("perPage", 10),
            ),
            entry(
                "/companies/search/{registration_number}?country=uk",
                HttpMethod::Get,
                "Fetch details of company by registration number",
                None,
                ParameterMap::new()
                    .with("registration_number", "04073082")
                    .with("country", "uk"),
            ),
            entry(
                "/document_forensics",
                HttpMethod::Post,
                "Request signed url to upload document",
                Some(json!({
                    "filename": "Name of file to upload",
                    "byte_size": "6788",
                    "checksum": "VtVrTvbyW7L2DOsRBsh0UQ==",
                    "content_type": "application/pdf",
                    "type_of_document": "proof_of_address"
                })),
                ParameterMap::new(),
            ),
            entry(
                "/document_forensics/{id}",
                HttpMethod::Get,
                "Fetch results of document indicators",
                Some(json!({ "id": DOCUMENT_ID })),
                ParameterMap::new().with("id", DOCUMENT_ID),
            ),
            entry(
                "/online_footprints",
                HttpMethod::Post,
                "Start Online Footprint Process",
                Some(json!({ "company_website_url": "https://regulon.io" })),
                ParameterMap::new(),
            ),
            entry(
                "/online_footprints/{id}",
                HttpMethod::Get,
                "Retrieve Online Footprint report",
                None,
                ParameterMap::new().with("id", FOOTPRINT_ID),
            ),
        ];

        Self::from_entries(entries)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OperationDescriptor> {
        self.operations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter()
    }

    /// Look up a descriptor, failing for indices outside `0..len`
    pub fn descriptor(&self, index: usize) -> Result<&OperationDescriptor> {
        self.get(index).ok_or(ConsoleError::UnknownOperation {
            index,
            len: self.len(),
        })
    }

    /// Resolve the path template of operation `index` against `params`
    pub fn resolve(&self, index: usize, params: &ParameterMap) -> Result<String> {
        let descriptor = self.descriptor(index)?;
        Ok(resolve(&descriptor.path_template, params))
    }
}

fn entry(
    template: &str,
    method: HttpMethod,
    label: &str,
    body: Option<serde_json::Value>,
    params: ParameterMap,
) -> (String, HttpMethod, String, SampleInvocation) {
    (
        template.to_string(),
        method,
        label.to_string(),
        SampleInvocation { method, body, params },
    )
}
