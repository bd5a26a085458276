//! Tool loaders
//!
//! | Loader | Tools come from | Calls go to |
//! |--------|-----------------|-------------|
//! | [`DirectToolLoader`] | the in-process command tree | the command itself |
//! | [`CompositeToolLoader`] | several loaders, concatenated | the loader that listed the tool |
//! | [`ProxyToolLoader`] | every discovered server | that server's cached client |
//! | [`SingleToolLoader`] | one gateway tool | learn → command navigation |

pub mod composite;
pub mod direct;
pub mod proxy;
pub mod single;

pub use composite::CompositeToolLoader;
pub use direct::DirectToolLoader;
pub use proxy::ProxyToolLoader;
pub use single::SingleToolLoader;
