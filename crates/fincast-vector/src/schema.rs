use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";
pub const META_TABLE: &str = "meta";

/// Chunk table: one row per chunk, `vector` sized to the embedder's dimension.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("doc_id", DataType::Utf8, false),
		Field::new("doc_path", DataType::Utf8, false),
		Field::new("category", DataType::Utf8, false),
		Field::new("content", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("total_chunks", DataType::Int32, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Key/value table holding the index manifest.
pub fn build_meta_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("key", DataType::Utf8, false),
		Field::new("value", DataType::Utf8, false),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}

/// Dimension of the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<i32> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => Some(*n),
		_ => None,
	}
}
