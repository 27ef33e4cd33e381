mod instance_id;
mod key;
mod path;

pub use instance_id::InstanceId;
pub use key::{LoadSource, PoolKey, TypeTag};
pub use path::AssetPath;
