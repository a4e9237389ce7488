pub mod images;
pub mod menu;
pub mod nutrition;
pub mod providers;
pub mod randomizer;
