//! Shared fixtures for the synchronizer tests: page builders and a wired-up
//! pipeline pointed at a `wiremock` server.

#![allow(dead_code)]

use std::sync::Arc;

use ccdb_core::County;
use ccdb_scraper::{HtmlParser, OdjfsClient};
use ccdb_sync::{ChildCareSynchronizer, CountySynchronizer, MemoryStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct Pipeline {
    pub store: Arc<MemoryStore>,
    pub counties: CountySynchronizer,
    pub child_cares: ChildCareSynchronizer,
}

pub fn pipeline(server: &MockServer, counties: &[&str]) -> Pipeline {
    let store = Arc::new(MemoryStore::with_counties(
        counties.iter().map(|name| County::new(*name)),
    ));
    let client =
        OdjfsClient::new(&server.uri(), "ccdb-test/0.1", 5).expect("failed to build test client");
    let parser = Arc::new(HtmlParser);

    Pipeline {
        counties: CountySynchronizer::new(client.clone(), parser.clone(), store.clone()),
        child_cares: ChildCareSynchronizer::new(client, parser, store.clone()),
        store,
    }
}

/// `(external_url_id, name, program type)` rows inside a layout table.
pub fn listing_page(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(id, name, program_type)| {
            format!(
                "<tr><td><a href=\"results2.asp?provider_number={id}&amp;Printable=Y\">{name}</a></td>\
                 <td>1 Elm St</td><td>Columbus</td><td>{program_type}</td><td>&nbsp;</td></tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table><tr><td>\
         <table><tr><th>Program Name</th><th>Address</th><th>City</th><th>Program Type</th><th>SUTQ</th></tr>\
         {body}</table></td></tr></table></body></html>"
    )
}

pub fn detail_page(program_type: &str, name: &str, county: &str) -> String {
    format!(
        "<html><body><table>\
         <tr><td>Program Type:</td><td>{program_type}</td></tr>\
         <tr><td>Name:</td><td>{name}</td></tr>\
         <tr><td>County:</td><td>{county}</td></tr>\
         <tr><td>Address:</td><td>1 Elm St</td></tr>\
         <tr><td>City:</td><td>Columbus</td></tr>\
         <tr><td>State:</td><td>OH</td></tr>\
         <tr><td>Zip:</td><td>43215</td></tr>\
         </table></body></html>"
    )
}

pub fn error_page(banner: &str) -> String {
    format!(
        "<html><body><font face=\"Arial\" size=2>\
         <p>Microsoft OLE DB Provider for Oracle</font> \
         <font face=\"Arial\" size=2>{banner}</font></p></body></html>"
    )
}

pub async fn mount_listing(server: &MockServer, county: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/cdc/results1.asp"))
        .and(query_param("county", county))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mounts a detail response that must be requested exactly `times` times.
pub async fn mount_detail(server: &MockServer, id: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/cdc/results2.asp"))
        .and(query_param("provider_number", id))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}
