//! Cache types for catalog and content responses.

use crate::backend::types::{CompanyInfo, HomepageData, Service};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Homepage(Box<HomepageData>),
    Services(Vec<Service>),
    Service(Box<Service>),
    Company(Box<CompanyInfo>),
}
