//! Optimized storage layer using RocksDB

use crate::config::{CompressionType, StorageConfig};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::{path::Path, sync::Arc};

#[derive(Clone)]
pub struct OptimizedStorage {
    db: Arc<DB>,
}

impl OptimizedStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rocksdb::Error> {
        Self::open(path, &StorageConfig::default())
    }

    /// Open the database described by `config`, wiping it first if `clear_on_start` is set
    pub fn new_with_config(config: &StorageConfig) -> Result<Self, rocksdb::Error> {
        if config.clear_on_start {
            tracing::warn!(path = %config.data_directory, "Clearing database on start");
            let _ = DB::destroy(&Options::default(), &config.data_directory);
        }
        Self::open(&config.data_directory, config)
    }

    fn open<P: AsRef<Path>>(path: P, config: &StorageConfig) -> Result<Self, rocksdb::Error> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(match config.compression_type {
            CompressionType::None => rocksdb::DBCompressionType::None,
            CompressionType::Snappy => rocksdb::DBCompressionType::Snappy,
            CompressionType::Lz4 => rocksdb::DBCompressionType::Lz4,
            CompressionType::Zstd => rocksdb::DBCompressionType::Zstd,
        });

        let db = DB::open(&opts, path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, rocksdb::Error> {
        self.db.get(key)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), rocksdb::Error> {
        self.db.put(key, value)
    }

    /// Write every key/value pair or none of them
    pub fn write_atomic(&self, puts: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), rocksdb::Error> {
        let mut batch = WriteBatch::default();
        for (key, value) in puts {
            batch.put(key, value);
        }
        self.db.write(batch)
    }

    /// Scan keys under `prefix` in ascending order, at most `limit` rows
    pub fn scan_prefix(&self, prefix: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>, rocksdb::Error> {
        let mut rows = Vec::with_capacity(limit.min(256));
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(prefix) || rows.len() >= limit {
                break;
            }
            rows.push((key.to_vec(), value.to_vec()));
        }
        Ok(rows)
    }
}
