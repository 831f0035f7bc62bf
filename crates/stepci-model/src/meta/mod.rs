mod object;
pub use object::ObjectMeta;

mod owner;
pub use owner::OwnerReference;
