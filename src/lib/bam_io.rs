//! BAM file I/O helpers.
//!
//! Readers and writers wrap either a single-threaded or a multi-threaded BGZF stream so callers
//! can choose threading with one argument and still work with the plain noodles BAM types.

use anyhow::{Context, Result};
use noodles::bgzf::io::{
    MultithreadedReader, MultithreadedWriter, Reader as BgzfReader, Writer as BgzfWriter,
    multithreaded_writer, writer::Builder as BgzfWriterBuilder, writer::CompressionLevel,
};
use noodles::sam::Header;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::num::NonZero;
use std::path::Path;

/// Either a single-threaded or a multi-threaded BGZF reader.
pub enum BgzfReaderEnum {
    /// Single-threaded BGZF reader (lower overhead for small files)
    SingleThreaded(BgzfReader<File>),
    /// Multi-threaded BGZF reader
    MultiThreaded(MultithreadedReader<File>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// BAM reader over either BGZF reader flavor.
pub type BamReaderAuto = noodles::bam::io::Reader<BgzfReaderEnum>;

/// Either a single-threaded or a multi-threaded BGZF writer.
pub enum BgzfWriterEnum {
    /// Single-threaded BGZF writer
    SingleThreaded(BgzfWriter<File>),
    /// Multi-threaded BGZF writer
    MultiThreaded(MultithreadedWriter<File>),
}

impl Write for BgzfWriterEnum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.write(buf),
            BgzfWriterEnum::MultiThreaded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.flush(),
            BgzfWriterEnum::MultiThreaded(w) => w.flush(),
        }
    }
}

impl BgzfWriterEnum {
    /// Flushes all pending blocks and writes the BGZF EOF marker.
    ///
    /// # Errors
    /// Returns an error if flushing or finalizing the writer fails.
    pub fn finish(self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(mut w) => {
                w.finish()?;
                Ok(())
            }
            BgzfWriterEnum::MultiThreaded(mut w) => {
                w.finish()?;
                Ok(())
            }
        }
    }
}

/// BAM writer over either BGZF writer flavor.
pub type BamWriter = noodles::bam::io::Writer<BgzfWriterEnum>;

/// Opens a BAM file and reads its header.
///
/// `threads > 1` decompresses with that many worker threads.
///
/// # Errors
/// Returns an error if the file cannot be opened or the header cannot be read.
///
/// # Example
/// ```no_run
/// use fgrealign_lib::bam_io::create_bam_reader;
/// use std::path::Path;
///
/// let (mut reader, header) = create_bam_reader(Path::new("input.bam"), 1).unwrap();
/// for record in reader.record_bufs(&header) {
///     let record = record.unwrap();
/// }
/// ```
pub fn create_bam_reader<P: AsRef<Path>>(
    path: P,
    threads: usize,
) -> Result<(BamReaderAuto, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let bgzf_reader = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => {
            BgzfReaderEnum::MultiThreaded(MultithreadedReader::with_worker_count(worker_count, file))
        }
        None => BgzfReaderEnum::SingleThreaded(BgzfReader::new(file)),
    };

    let mut reader = noodles::bam::io::Reader::from(bgzf_reader);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((reader, header))
}

/// Creates a BAM file and writes `header` to it.
///
/// `threads > 1` compresses with that many worker threads. A `compression_level` that the BGZF
/// codec does not accept falls back to its default level.
///
/// # Errors
/// Returns an error if the file cannot be created or the header cannot be written.
pub fn create_bam_writer<P: AsRef<Path>>(
    path: P,
    header: &Header,
    threads: usize,
    compression_level: u32,
) -> Result<BamWriter> {
    let path_ref = path.as_ref();
    let output_file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;

    let level = u8::try_from(compression_level).ok().and_then(CompressionLevel::new);

    let bgzf_writer = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => {
            let mut builder = multithreaded_writer::Builder::default().set_worker_count(worker_count);
            if let Some(cl) = level {
                builder = builder.set_compression_level(cl);
            }
            BgzfWriterEnum::MultiThreaded(builder.build_from_writer(output_file))
        }
        None => {
            let mut builder = BgzfWriterBuilder::default();
            if let Some(cl) = level {
                builder = builder.set_compression_level(cl);
            }
            BgzfWriterEnum::SingleThreaded(builder.build_from_writer(output_file))
        }
    };

    let mut writer = noodles::bam::io::Writer::from(bgzf_writer);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;
    Ok(writer)
}

/// Returns true if the header declares `SO:coordinate`.
#[must_use]
pub fn is_coordinate_sorted(header: &Header) -> bool {
    header
        .header()
        .and_then(|hd| hd.other_fields().get(&header_tag::SORT_ORDER))
        .is_some_and(|so| so == "coordinate")
}
