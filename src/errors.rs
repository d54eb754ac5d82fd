// Create the Error, ErrorKind, ResultExt, and Result types.
// Other modules `use crate::errors::*;` to get all of them.
#![allow(deprecated)]

use error_chain::*;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
        ImageFailure(::image::ImageError);
    }

    errors {
        InvalidDimensions(width: usize, height: usize) {
            description("invalid maze display dimensions")
            display("display dimensions {}x{} must be odd, non-zero and addressable", width, height)
        }
    }
}
