pub mod conformers;
pub mod measure;
pub mod run;
pub mod split;
