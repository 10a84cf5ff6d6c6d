pub mod captions;
pub mod fit;
pub mod layout;
pub mod text;
