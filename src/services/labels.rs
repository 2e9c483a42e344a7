//! Labels.

use crate::api::types::Page;
use crate::api::{Client, Query, Response};
use crate::error::Result;

use super::PageOptions;

/// Label operations.
#[derive(Debug, Clone, Copy)]
pub struct LabelsService<'a> {
    pub(super) client: &'a Client,
}

impl<'a> LabelsService<'a> {
    /// List labels used on the site, one page at a time.
    pub async fn list(&self, page: PageOptions) -> Result<Response<Page<String>>> {
        let path = page.apply(Query::new()).apply("/rest/api/3/label");
        self.client.get(&path).await
    }
}
