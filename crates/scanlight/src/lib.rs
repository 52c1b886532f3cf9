#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use scanlight_3d as threed;

#[doc(inline)]
pub use scanlight_calib as calib;

#[doc(inline)]
pub use scanlight_image as image;

#[doc(inline)]
pub use scanlight_reconstruct as reconstruct;
