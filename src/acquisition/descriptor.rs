//! Package descriptors.
//!
//! A descriptor names a package and its declared dependencies. Parsing goes
//! through the versioned [`DescriptorParser`] trait; [`NuspecParser`] reads
//! the `.nuspec` XML shipped at the root of a `.nupkg` archive.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use zip::ZipArchive;

use super::fault::FetchError;

/// One declared dependency: a package id and a version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub id: String,
    pub range: String,
}

/// What a package says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Version of the descriptor format that produced this value.
    pub schema: u32,
    pub id: String,
    pub version: String,
    pub dependencies: Vec<DependencySpec>,
}

/// Reads a descriptor out of an archive entry.
pub trait DescriptorParser: Send + Sync {
    /// Format version of the descriptors this parser yields.
    fn schema(&self) -> u32;

    /// Whether an archive entry holds the descriptor.
    fn matches(&self, entry_name: &str) -> bool;

    fn parse(&self, bytes: &[u8]) -> Result<PackageDescriptor, FetchError>;
}

/// Locate and parse the descriptor entry of an archive.
pub fn read_descriptor<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    parser: &dyn DescriptorParser,
) -> Result<PackageDescriptor, FetchError> {
    let index = (0..archive.len())
        .find(|&i| {
            archive
                .name_for_index(i)
                .is_some_and(|name| parser.matches(name))
        })
        .ok_or_else(|| FetchError::corrupt("archive has no package descriptor"))?;

    let mut entry = archive.by_index(index)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    parser.parse(&bytes)
}

/// Parser for `.nuspec` manifests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NuspecParser;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Id,
    Version,
}

impl DescriptorParser for NuspecParser {
    fn schema(&self) -> u32 {
        1
    }

    /// Only a root-level `*.nuspec` counts.
    fn matches(&self, entry_name: &str) -> bool {
        !entry_name.contains('/') && entry_name.to_lowercase().ends_with(".nuspec")
    }

    fn parse(&self, bytes: &[u8]) -> Result<PackageDescriptor, FetchError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut id = None;
        let mut version = None;
        let mut dependencies: Vec<DependencySpec> = Vec::new();
        let mut in_metadata = false;
        let mut field: Option<Field> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| FetchError::corrupt(format!("invalid nuspec: {}", e)))?;
            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"metadata" => in_metadata = true,
                    b"id" if in_metadata => field = Some(Field::Id),
                    b"version" if in_metadata => field = Some(Field::Version),
                    b"dependency" => push_dependency(&e, &mut dependencies)?,
                    _ => {}
                },
                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"dependency" {
                        push_dependency(&e, &mut dependencies)?;
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = field {
                        let value = text
                            .unescape()
                            .map_err(|e| FetchError::corrupt(format!("invalid nuspec: {}", e)))?
                            .trim()
                            .to_string();
                        match current {
                            Field::Id => id = Some(value),
                            Field::Version => version = Some(value),
                        }
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"metadata" => in_metadata = false,
                    b"id" | b"version" => field = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let id = id.ok_or_else(|| FetchError::corrupt("nuspec has no <id>"))?;
        let version = version.ok_or_else(|| FetchError::corrupt("nuspec has no <version>"))?;
        Ok(PackageDescriptor {
            schema: self.schema(),
            id,
            version,
            dependencies,
        })
    }
}

/// Record a `<dependency>`; repeated ids across framework groups keep the first.
fn push_dependency(
    element: &BytesStart<'_>,
    dependencies: &mut Vec<DependencySpec>,
) -> Result<(), FetchError> {
    let mut id = None;
    let mut range = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| FetchError::corrupt(format!("invalid nuspec: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| FetchError::corrupt(format!("invalid nuspec: {}", e)))?
            .to_string();
        match attr.key.local_name().as_ref() {
            b"id" => id = Some(value),
            b"version" => range = Some(value),
            _ => {}
        }
    }

    let id = id.ok_or_else(|| FetchError::corrupt("dependency without id"))?;
    if dependencies.iter().any(|d| d.id.eq_ignore_ascii_case(&id)) {
        return Ok(());
    }
    dependencies.push(DependencySpec {
        id,
        // A missing range means any version; the floor is then 0.0.0.
        range: range.unwrap_or_else(|| "0.0.0".to_string()),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>Contoso.Core</id>
    <version>1.2.0</version>
    <authors>Contoso &amp; Co</authors>
    <dependencies>
      <group targetFramework="net6.0">
        <dependency id="Contoso.Logging" version="[1.0,2.0)" />
        <dependency id="Contoso.Json" version="2.0" exclude="Build" />
      </group>
      <group targetFramework="net7.0">
        <dependency id="contoso.logging" version="1.5" />
        <dependency id="Contoso.Http" />
      </group>
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn parses_identity_and_dependencies() {
        let descriptor = NuspecParser.parse(NUSPEC.as_bytes()).unwrap();
        assert_eq!(descriptor.schema, 1);
        assert_eq!(descriptor.id, "Contoso.Core");
        assert_eq!(descriptor.version, "1.2.0");
        let deps: Vec<(&str, &str)> = descriptor
            .dependencies
            .iter()
            .map(|d| (d.id.as_str(), d.range.as_str()))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("Contoso.Logging", "[1.0,2.0)"),
                ("Contoso.Json", "2.0"),
                ("Contoso.Http", "0.0.0"),
            ]
        );
    }

    #[test]
    fn missing_id_is_corrupt() {
        let err = NuspecParser
            .parse(b"<package><metadata><version>1.0</version></metadata></package>")
            .unwrap_err();
        assert!(err.message.contains("<id>"));
    }

    #[test]
    fn malformed_xml_is_corrupt() {
        let err = NuspecParser
            .parse(b"<package><metadata><id>x</version></package>")
            .unwrap_err();
        assert_eq!(err.kind, crate::acquisition::fault::FaultKind::CorruptData);
    }

    #[test]
    fn matches_root_nuspec_only() {
        assert!(NuspecParser.matches("Contoso.Core.nuspec"));
        assert!(NuspecParser.matches("contoso.core.NUSPEC"));
        assert!(!NuspecParser.matches("content/readme.nuspec"));
        assert!(!NuspecParser.matches("lib/net6.0/Contoso.Core.dll"));
    }

    #[test]
    fn reads_descriptor_from_archive() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("lib/net6.0/Contoso.Core.dll", options).unwrap();
        writer.write_all(b"binary").unwrap();
        writer.start_file("Contoso.Core.nuspec", options).unwrap();
        writer.write_all(NUSPEC.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let descriptor = read_descriptor(&mut archive, &NuspecParser).unwrap();
        assert_eq!(descriptor.id, "Contoso.Core");
    }

    #[test]
    fn archive_without_descriptor_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let err = read_descriptor(&mut archive, &NuspecParser).unwrap_err();
        assert!(err.message.contains("no package descriptor"));
    }
}
