//! Document reader (spec.md §4.F): the public facade over a parsed PDF file.
//!
//! `Document::open` reads the whole file into memory (the teacher's own loader does
//! the same — `Read::read_to_end` up front — rather than juggling a seekable handle),
//! locates the xref chain, authenticates encryption if present, and returns a handle
//! that resolves indirect references on demand. Resolved objects are cached; the page
//! tree is flattened lazily on first access (spec.md §3 Lifecycle).

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use log::warn;

use crate::cancel::{Cancel, Never};
use crate::encryption::EncryptionState;
use crate::error::{Error, FormatError, ParseError, Result};
use crate::filters;
use crate::limits::Limits;
use crate::object::{Dictionary, Object, ObjectId, Stream};
use crate::object_stream::ObjectStream;
use crate::parser;
use crate::xref::{Xref, XrefEntry};

/// A navigable PDF object graph (spec.md §3 `Document`).
pub struct Document {
    buffer: Vec<u8>,
    version: String,
    xref: Xref,
    trailer: Dictionary,
    encryption: Option<EncryptionState>,
    encrypt_ref: Option<ObjectId>,
    objects: RwLock<std::collections::HashMap<ObjectId, Object>>,
    page_index: Mutex<Option<Vec<ObjectId>>>,
    limits: Limits,
}

/// One page in the page tree, paired with the document so inherited attributes
/// (`/Resources`, `/MediaBox`, `/CropBox`, `/Rotate`) can be walked up the parent
/// chain on demand (spec.md §4.F).
pub struct Page<'doc> {
    document: &'doc Document,
    pub id: ObjectId,
    dict: Dictionary,
}

/// Fallback page size (US Letter, in points) used only when neither the page nor
/// any ancestor carries a `/MediaBox` — a malformed but common producer quirk.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

impl Document {
    /// Opens `path` with the empty user password (spec.md §6 `Open`).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Document> {
        Self::open_with_password(path, "")
    }

    pub fn open_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Document> {
        let buffer = fs::read(path)?;
        Self::open_mem_with_password(buffer, password)
    }

    pub fn open_mem(buffer: Vec<u8>) -> Result<Document> {
        Self::open_mem_with_password(buffer, "")
    }

    pub fn open_mem_with_password(buffer: Vec<u8>, password: &str) -> Result<Document> {
        let version = parser::header_version(&buffer)?;
        let limits = Limits::default();
        let start = parser::locate_startxref(&buffer)?;
        let (xref, trailer) = parser::walk_xref_chain(&buffer, start, &limits)?;

        let mut document = Document {
            buffer,
            version,
            xref,
            trailer,
            encryption: None,
            encrypt_ref: None,
            objects: RwLock::new(std::collections::HashMap::new()),
            page_index: Mutex::new(None),
            limits,
        };

        if let Ok(encrypt_ref) = document.trailer.get(b"Encrypt").and_then(Object::as_reference) {
            document.encrypt_ref = Some(encrypt_ref);
            let encrypt_dict = document
                .load_object_uncached(encrypt_ref)?
                .as_dict()
                .map_err(|_| FormatError::MalformedTrailer)?
                .clone();
            let id0 = document
                .trailer
                .get(b"ID")
                .and_then(Object::as_array)
                .ok()
                .and_then(|arr| arr.first())
                .and_then(|o| o.as_str().ok())
                .unwrap_or(&[])
                .to_vec();
            document.encryption = Some(EncryptionState::authenticate(&encrypt_dict, &id0, password)?);
        }

        Ok(document)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn catalog(&self) -> Result<Dictionary> {
        let root = self.trailer.get(b"Root").and_then(Object::as_reference).map_err(|_| FormatError::MissingCatalog)?;
        self.get_object(root)?.as_dict().map(Dictionary::clone).map_err(|_| FormatError::MissingCatalog.into())
    }

    /// Resolves `(number, generation)` to an object. Never errors: unknown
    /// numbers, free entries, and generation mismatches all resolve to `Null`
    /// (spec.md §4.F `Object`).
    pub fn object(&self, id: ObjectId) -> Object {
        self.get_object(id).unwrap_or(Object::Null)
    }

    /// Fallible variant used internally and by callers that want to
    /// distinguish "resolved to Null because absent" from a hard I/O/parse
    /// failure. Still maps absence/free/generation-mismatch to `Ok(Null)`.
    pub fn get_object(&self, id: ObjectId) -> Result<Object> {
        if let Some(obj) = self.objects.read().expect("object cache poisoned").get(&id) {
            return Ok(obj.clone());
        }

        let obj = match self.xref.get(id.0) {
            None => Object::Null,
            Some(XrefEntry::Free { .. }) | Some(XrefEntry::UnusableFree) => Object::Null,
            Some(XrefEntry::Normal { generation, .. }) if *generation != id.1 => Object::Null,
            Some(XrefEntry::Normal { .. }) => self.load_object_uncached(id)?,
            Some(XrefEntry::Compressed { container, index }) => {
                let container_id = (*container, 0);
                let index = *index as usize;
                let container_obj = self.get_object(container_id)?;
                let mut container_stream = container_obj.as_stream().map_err(|_| FormatError::InvalidObjectStream)?.clone();
                self.decrypt_stream_content(container_id, &mut container_stream)?;
                let object_stream = ObjectStream::parse(&container_stream, self.limits.max_decompressed_size)?;
                let (_, obj) = object_stream.object_at(index)?;
                obj
            }
        };

        // Double-checked insert: first writer wins (spec.md §5); a losing
        // concurrent parse of the same object is wasted work, not a bug.
        let mut cache = self.objects.write().expect("object cache poisoned");
        let obj = cache.entry(id).or_insert(obj).clone();
        Ok(obj)
    }

    /// Parses object `id` straight from its xref offset, decrypting nested
    /// strings in place. Does not consult or populate the cache (callers that
    /// want caching go through [`Document::get_object`]).
    fn load_object_uncached(&self, id: ObjectId) -> Result<Object> {
        let offset = match self.xref.get(id.0) {
            Some(XrefEntry::Normal { offset, generation }) if *generation == id.1 => *offset as usize,
            _ => return Ok(Object::Null),
        };
        let (actual_id, mut obj) = parser::indirect_object(&self.buffer, offset, Some(&self.xref), Some(&self.limits))?;
        if actual_id != id {
            warn!("xref offset for {:?} actually contains object {:?}; using it anyway", id, actual_id);
        }

        if let Some(ref enc) = self.encryption {
            if self.encrypt_ref != Some(id) {
                enc.decrypt_strings(id, &mut obj)?;
            }
        }

        Ok(obj)
    }

    /// Decrypts a stream's raw `content` in place, honoring the `/Metadata`
    /// `/EncryptMetadata false` exemption (spec.md §4.E).
    fn decrypt_stream_content(&self, id: ObjectId, stream: &mut Stream) -> Result<()> {
        let Some(ref enc) = self.encryption else { return Ok(()) };
        if self.encrypt_ref == Some(id) {
            return Ok(());
        }
        if stream.dict.has_type(b"Metadata") && !enc.encrypt_metadata() {
            return Ok(());
        }
        stream.content = enc.decrypt_stream(id, &stream.content)?;
        Ok(())
    }

    /// Recursively resolves `IndirectReference`s nested inside Arrays and
    /// Dictionaries. Streams are left unresolved: their dictionary is returned
    /// as-is rather than descending into it (spec.md §4.F `Resolve`).
    pub fn resolve(&self, obj: &Object) -> Result<Object> {
        self.resolve_cancellable(obj, &Never)
    }

    /// As [`Document::resolve`], but polls `cancel` at each reference hop
    /// (spec.md §5 "next object" checkpoint).
    pub fn resolve_cancellable(&self, obj: &Object, cancel: &dyn Cancel) -> Result<Object> {
        self.resolve_inner(obj, &mut HashSet::new(), 0, cancel)
    }

    fn resolve_inner(&self, obj: &Object, visited: &mut HashSet<ObjectId>, depth: u32, cancel: &dyn Cancel) -> Result<Object> {
        if depth > self.limits.max_recursion_depth {
            return Err(crate::error::LimitError::RecursionDepth.into());
        }
        match obj {
            Object::Reference(id) => {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                if !visited.insert(*id) {
                    warn!("reference cycle detected at {:?}; leaving unresolved", id);
                    return Ok(Object::Reference(*id));
                }
                let resolved = self.get_object(*id)?;
                let result = self.resolve_inner(&resolved, visited, depth + 1, cancel);
                visited.remove(id);
                result
            }
            Object::Array(items) => {
                let resolved = items
                    .iter()
                    .map(|i| self.resolve_inner(i, visited, depth + 1, cancel))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Object::Array(resolved))
            }
            Object::Dictionary(dict) => {
                let mut out = Dictionary::new();
                for (k, v) in dict.iter() {
                    out.set(k.clone(), self.resolve_inner(v, visited, depth + 1, cancel)?);
                }
                Ok(Object::Dictionary(out))
            }
            // Streams, and every primitive kind, are returned unchanged.
            other => Ok(other.clone()),
        }
    }

    /// Fetches `/Length`, decrypts, and applies the stream's `/Filter` chain
    /// (spec.md §4.F "Stream decoding on demand"). Intermediate buffers are not
    /// retained beyond this call.
    pub fn decode_stream(&self, id: ObjectId, stream: &Stream) -> Result<Vec<u8>> {
        self.decode_stream_cancellable(id, stream, &Never)
    }

    pub fn decode_stream_cancellable(&self, id: ObjectId, stream: &Stream, cancel: &dyn Cancel) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut stream = stream.clone();
        self.decrypt_stream_content(id, &mut stream)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        filters::decode_stream(&stream, self.limits.max_decompressed_size)
    }

    /// The flattened, depth-first leaf list of the page tree, built on first
    /// access (spec.md §3 Lifecycle) and cached for the document's lifetime.
    fn page_ids(&self, cancel: &dyn Cancel) -> Result<Vec<ObjectId>> {
        {
            let guard = self.page_index.lock().expect("page index mutex poisoned");
            if let Some(ids) = guard.as_ref() {
                return Ok(ids.clone());
            }
        }

        let catalog = self.catalog()?;
        let pages_ref = catalog.get(b"Pages").and_then(Object::as_reference).map_err(|_| FormatError::MissingPageTree)?;
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        self.walk_page_tree(pages_ref, &mut ids, &mut seen, 0, cancel)?;

        *self.page_index.lock().expect("page index mutex poisoned") = Some(ids.clone());
        Ok(ids)
    }

    fn walk_page_tree(&self, id: ObjectId, out: &mut Vec<ObjectId>, seen: &mut HashSet<ObjectId>, depth: u32, cancel: &dyn Cancel) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if depth > self.limits.max_page_tree_depth {
            return Err(crate::error::LimitError::PageTreeDepth.into());
        }
        if !seen.insert(id) {
            return Err(Error::ReferenceCycle(id));
        }
        let node = self.get_object(id)?;
        let dict = node.as_dict().map_err(|_| FormatError::MalformedPageTree)?;
        match dict.get_type() {
            Ok(t) if t == b"Pages" => {
                let kids = dict.get(b"Kids").and_then(Object::as_array).map_err(|_| FormatError::MalformedPageTree)?;
                for kid in kids {
                    let kid_id = kid.as_reference().map_err(|_| FormatError::MalformedPageTree)?;
                    self.walk_page_tree(kid_id, out, seen, depth + 1, cancel)?;
                }
            }
            // A conforming file always sets /Type /Page on a leaf, but some
            // producers omit it; treat any non-/Pages node as a leaf.
            _ => out.push(id),
        }
        seen.remove(&id);
        Ok(())
    }

    pub fn page_count(&self) -> Result<u32> {
        Ok(self.page_ids(&Never)?.len() as u32)
    }

    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        self.page_cancellable(index, &Never)
    }

    /// As [`Document::page`], but polls `cancel` once per page-tree hop while
    /// building the (cached) flattened page list (spec.md §5 "next page-tree
    /// hop" checkpoint).
    pub fn page_cancellable(&self, index: usize, cancel: &dyn Cancel) -> Result<Page<'_>> {
        let ids = self.page_ids(cancel)?;
        let count = ids.len();
        let id = *ids.get(index).ok_or(Error::OutOfRange { index, count })?;
        let dict = self.get_object(id)?.as_dict().map_err(|_| FormatError::MalformedPageTree)?.clone();
        Ok(Page { document: self, id, dict })
    }

    pub fn close(self) {}
}

impl Page<'_> {
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Walks `/Parent` looking for `key`, starting at this page's own
    /// dictionary (spec.md §4.F "inherited attributes").
    fn inherited(&self, key: &[u8]) -> Option<Object> {
        let mut current = self.dict.clone();
        let mut seen = HashSet::new();
        seen.insert(self.id);
        loop {
            if let Ok(v) = current.get(key) {
                return Some(v.clone());
            }
            let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
            if !seen.insert(parent_id) {
                return None;
            }
            current = self.document.get_object(parent_id).ok()?.as_dict().ok()?.clone();
        }
    }

    pub fn media_box(&self) -> Result<[f64; 4]> {
        let Some(obj) = self.inherited(b"MediaBox") else {
            return Ok(DEFAULT_MEDIA_BOX);
        };
        let resolved = self.document.resolve(&obj)?;
        let arr = resolved.as_array().map_err(|_| FormatError::MalformedPageTree)?;
        if arr.len() != 4 {
            return Err(FormatError::MalformedPageTree.into());
        }
        let mut box_values = [0.0; 4];
        for (i, v) in arr.iter().enumerate() {
            box_values[i] = v.as_f64().map_err(|_| FormatError::MalformedPageTree)?;
        }
        Ok(box_values)
    }

    /// Normalized to one of `{0, 90, 180, 270}` (spec.md §6 `Page.Rotate`).
    pub fn rotate(&self) -> i64 {
        let raw = self
            .inherited(b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        ((raw % 360) + 360) % 360
    }

    pub fn resources(&self) -> Result<Dictionary> {
        let obj = self.inherited(b"Resources").ok_or(FormatError::MalformedPageTree)?;
        self.document.resolve(&obj)?.as_dict().map(Dictionary::clone).map_err(|_| FormatError::MalformedPageTree.into())
    }

    /// Concatenated, filter-decoded bytes of `/Contents` (spec.md §6
    /// `Page.ContentsBytes`): a single stream reference, or an array of them.
    pub fn contents_bytes(&self) -> Result<Vec<u8>> {
        let contents = match self.dict.get(b"Contents") {
            Ok(obj) => obj.clone(),
            Err(_) => return Ok(Vec::new()),
        };

        let refs: Vec<ObjectId> = match &contents {
            Object::Reference(id) => vec![*id],
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => return Err(ParseError::UnexpectedToken.into()),
        };

        let mut out = Vec::new();
        for id in refs {
            let obj = self.document.get_object(id)?;
            let stream = obj.as_stream().map_err(|_| FormatError::MalformedPageTree)?;
            let mut chunk = self.document.decode_stream(id, stream)?;
            out.append(&mut chunk);
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf(media_box: &str, extra_catalog_trailer: bool) -> Vec<u8> {
        let _ = extra_catalog_trailer;
        let body = format!(
            "%PDF-1.7\n\
             1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
             2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n\
             3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[{media_box}]/Resources<<>>>>endobj\n"
        );
        let offsets = compute_offsets(&body);
        let xref = format!(
            "xref\n0 4\n0000000000 65535 f \n{:010} 00000 n \n{:010} 00000 n \n{:010} 00000 n \ntrailer\n<</Root 1 0 R/Size 4>>\nstartxref\n{}\n%%EOF",
            offsets[0], offsets[1], offsets[2], body.len()
        );
        format!("{body}{xref}").into_bytes()
    }

    fn compute_offsets(body: &str) -> Vec<usize> {
        body.match_indices(" 0 obj").map(|(i, _)| {
            // back up to the start of the line containing "N 0 obj"
            body[..i].rfind('\n').map(|p| p + 1).unwrap_or(0)
        }).collect()
    }

    #[test]
    fn s1_minimal_pdf() {
        let bytes = minimal_pdf("0 0 612 792", false);
        let doc = Document::open_mem(bytes).unwrap();
        assert_eq!(doc.version(), "1.7");
        assert_eq!(doc.page_count().unwrap(), 1);
        assert_eq!(doc.page(0).unwrap().media_box().unwrap(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn s2_multi_page_classic_xref_has_distinct_page_identities() {
        let mut body = String::from("%PDF-1.7\n");
        body.push_str("1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
        body.push_str("2 0 obj<</Type/Pages/Kids[3 0 R 4 0 R 5 0 R]/Count 3>>endobj\n");
        for n in 3..=5u32 {
            body.push_str(&format!(
                "{n} 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 {w} {w}]/Resources<<>>>>endobj\n",
                w = 100 * n
            ));
        }
        let offsets = compute_offsets(&body);
        let mut xref = "xref\n0 6\n0000000000 65535 f \n".to_string();
        for off in &offsets {
            xref.push_str(&format!("{off:010} 00000 n \n"));
        }
        xref.push_str(&format!("trailer\n<</Root 1 0 R/Size 6>>\nstartxref\n{}\n%%EOF", body.len()));
        let bytes = format!("{body}{xref}").into_bytes();

        let doc = Document::open_mem(bytes).unwrap();
        assert_eq!(doc.page_count().unwrap(), 3);
        let ids: Vec<ObjectId> = (0..3).map(|i| doc.page(i).unwrap().id).collect();
        assert_eq!(ids, vec![(3, 0), (4, 0), (5, 0)]);
        assert_eq!(doc.page(0).unwrap().media_box().unwrap()[2], 300.0);
        assert_eq!(doc.page(2).unwrap().media_box().unwrap()[2], 500.0);
    }

    #[test]
    fn s3_nested_page_tree_preserves_dfs_order() {
        // Root /Pages has Kids [leaf0, intermediate], intermediate has Kids [leaf1, leaf2, leaf3].
        // Only the root /Pages node declares /Resources; the leaves and the
        // intermediate node inherit it by walking /Parent.
        let mut body = String::from("%PDF-1.7\n");
        body.push_str("1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
        body.push_str("2 0 obj<</Type/Pages/Kids[3 0 R 4 0 R]/Count 4/Resources<</Font<</F1 9 0 R>>>>>>endobj\n");
        body.push_str("3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 10 10]>>endobj\n");
        body.push_str("4 0 obj<</Type/Pages/Parent 2 0 R/Kids[5 0 R 6 0 R 7 0 R]/Count 3>>endobj\n");
        body.push_str("5 0 obj<</Type/Page/Parent 4 0 R/MediaBox[0 0 20 20]>>endobj\n");
        body.push_str("6 0 obj<</Type/Page/Parent 4 0 R/MediaBox[0 0 30 30]>>endobj\n");
        body.push_str("7 0 obj<</Type/Page/Parent 4 0 R/MediaBox[0 0 40 40]>>endobj\n");
        let offsets = compute_offsets(&body);
        let mut xref = "xref\n0 8\n0000000000 65535 f \n".to_string();
        for off in &offsets {
            xref.push_str(&format!("{off:010} 00000 n \n"));
        }
        xref.push_str(&format!("trailer\n<</Root 1 0 R/Size 8>>\nstartxref\n{}\n%%EOF", body.len()));
        let bytes = format!("{body}{xref}").into_bytes();

        let doc = Document::open_mem(bytes).unwrap();
        assert_eq!(doc.page_count().unwrap(), 4);
        let ids: Vec<ObjectId> = (0..4).map(|i| doc.page(i).unwrap().id).collect();
        assert_eq!(ids, vec![(3, 0), (5, 0), (6, 0), (7, 0)]);
        // Leaf 5 (page index 1) inherits /Resources from the root /Pages node
        // two /Parent hops up, through the intermediate node that declares none.
        let resources = doc.page(1).unwrap().resources().unwrap();
        assert!(resources.has(b"Font"));
    }

    /// Builds a raw entry row for xref-stream object `/W [1 2 1]`: 1-byte type,
    /// 2-byte big-endian offset/field, 1-byte generation/index.
    fn xref_stream_row(kind: u8, f2: u16, f3: u8) -> [u8; 4] {
        let f2b = f2.to_be_bytes();
        [kind, f2b[0], f2b[1], f3]
    }

    /// PNG "Up" predictor encoding: each row's bytes are replaced with their
    /// difference from the same column in the previous row (zero for row 0),
    /// prefixed with the filter-type byte, mirroring what `predictor::apply`'s
    /// PNG branch expects to undo.
    fn png_up_encode(rows: &[[u8; 4]]) -> Vec<u8> {
        let mut out = Vec::with_capacity(rows.len() * 5);
        let mut prev = [0u8; 4];
        for row in rows {
            out.push(2); // filter type: Up
            for i in 0..4 {
                out.push(row[i].wrapping_sub(prev[i]));
            }
            prev = *row;
        }
        out
    }

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        use std::io::Write;
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn s4_flate_png_predictor_xref_stream_resolves_offsets() {
        let mut body = String::from("%PDF-1.7\n");
        body.push_str("1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
        body.push_str("2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n");
        body.push_str("3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]/Resources<<>>>>endobj\n");
        let offsets = compute_offsets(&body);
        let xref_obj_offset = body.len();

        let rows = [
            xref_stream_row(0, 0, 0),                      // object 0: free
            xref_stream_row(1, offsets[0] as u16, 0),      // object 1
            xref_stream_row(1, offsets[1] as u16, 0),      // object 2
            xref_stream_row(1, offsets[2] as u16, 0),      // object 3
            xref_stream_row(1, xref_obj_offset as u16, 0), // object 4: this xref stream
        ];
        let predicted = png_up_encode(&rows);
        let compressed = zlib_compress(&predicted);

        let mut full = body.into_bytes();
        full.extend_from_slice(format!(
            "4 0 obj<</Type/XRef/W[1 2 1]/Size 5/Root 1 0 R/Filter/FlateDecode\
             /DecodeParms<</Predictor 12/Columns 4>>/Length {}>>stream\n",
            compressed.len()
        ).as_bytes());
        full.extend_from_slice(&compressed);
        full.extend_from_slice(b"\nendstream\nendobj\n");
        full.extend_from_slice(format!("startxref\n{xref_obj_offset}\n%%EOF").as_bytes());

        let doc = Document::open_mem(full).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
        assert_eq!(doc.page(0).unwrap().media_box().unwrap(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn s5_object_stream_compressed_catalog_resolves() {
        // Catalog (object 1) lives inside object-stream object 3; objects 2
        // (Pages) and 4 (Page) stay as regular indirect objects.
        let mut body = String::from("%PDF-1.7\n");
        body.push_str("2 0 obj<</Type/Pages/Kids[4 0 R]/Count 1>>endobj\n");
        body.push_str("4 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 200 200]/Resources<<>>>>endobj\n");

        let offsets: Vec<usize> = body
            .match_indices(" 0 obj")
            .map(|(i, _)| body[..i].rfind('\n').map(|p| p + 1).unwrap_or(0))
            .collect();
        let obj2_offset = offsets[0];
        let obj4_offset = offsets[1];

        // Build the object stream packing object 1 (the Catalog).
        let catalog_body = "<</Type/Catalog/Pages 2 0 R>>";
        let header = "1 0 ";
        let first = header.len();
        let raw = format!("{header}{catalog_body}").into_bytes();
        let compressed = zlib_compress(&raw);

        let objstm_offset = body.len();
        body.push_str(&format!(
            "3 0 obj<</Type/ObjStm/N 1/First {first}/Filter/FlateDecode/Length {}>>stream\n",
            compressed.len()
        ));
        let mut full = body.into_bytes();
        full.extend_from_slice(&compressed);
        full.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_obj_offset = full.len();
        let rows = [
            xref_stream_row(0, 0, 0),                      // object 0: free
            xref_stream_row(2, 3, 0),                      // object 1: compressed, in container 3, index 0
            xref_stream_row(1, obj2_offset as u16, 0),     // object 2
            xref_stream_row(1, objstm_offset as u16, 0),   // object 3: the ObjStm itself
            xref_stream_row(1, obj4_offset as u16, 0),     // object 4
            xref_stream_row(1, xref_obj_offset as u16, 0), // object 5: this xref stream
        ];
        let predicted = png_up_encode(&rows);
        let xref_compressed = zlib_compress(&predicted);
        full.extend_from_slice(format!(
            "5 0 obj<</Type/XRef/W[1 2 1]/Size 6/Root 1 0 R/Filter/FlateDecode\
             /DecodeParms<</Predictor 12/Columns 4>>/Length {}>>stream\n",
            xref_compressed.len()
        ).as_bytes());
        full.extend_from_slice(&xref_compressed);
        full.extend_from_slice(b"\nendstream\nendobj\n");
        full.extend_from_slice(format!("startxref\n{xref_obj_offset}\n%%EOF").as_bytes());

        let doc = Document::open_mem(full).unwrap();
        let catalog = doc.catalog().unwrap();
        assert_eq!(catalog.get_type().unwrap(), b"Catalog");
        assert_eq!(doc.page_count().unwrap(), 1);
    }

    #[test]
    fn s10_cycle_resolves_without_overflow() {
        let body = "%PDF-1.7\n1 0 obj[2 0 R]endobj\n2 0 obj[1 0 R]endobj\n".to_string();
        let offsets = compute_offsets(&body);
        let xref = format!(
            "xref\n0 3\n0000000000 65535 f \n{:010} 00000 n \n{:010} 00000 n \ntrailer\n<</Root 1 0 R/Size 3>>\nstartxref\n{}\n%%EOF",
            offsets[0], offsets[1], body.len()
        );
        let bytes = format!("{body}{xref}").into_bytes();
        let doc = Document::open_mem(bytes).unwrap();
        let obj = doc.object((1, 0));
        // Must terminate; a cycle is broken rather than recursing forever.
        let _ = doc.resolve(&obj);
    }
}
