pub mod dbase_arrow;
