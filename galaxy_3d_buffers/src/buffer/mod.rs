/// Buffer module - backing arena and the vertex/index/joint buffer views

pub mod arena;
pub mod buffer_view;
pub mod vertex_buffer;
pub mod index_buffer;
pub mod joint_buffer;

pub use arena::*;
pub use buffer_view::*;
pub use vertex_buffer::*;
pub use index_buffer::*;
pub use joint_buffer::*;
