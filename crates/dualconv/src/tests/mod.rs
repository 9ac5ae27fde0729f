mod binary_bad;
mod binary_good;
mod json_good;
