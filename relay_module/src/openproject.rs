mod client;
mod lookup;
mod models;

pub use client::{filter, WorkPackageClient};
pub use lookup::LookupResolver;
pub use models::{
    Collection, CollectionElements, CountResult, Formattable, Link, Principal, ProjectRecord,
    Status, Version, VersionLinks, WorkPackage, WorkPackageEmbedded, WorkPackageLinks,
    WorkPackageType,
};
