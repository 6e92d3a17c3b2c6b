pub mod filename_utils;
