//! Maps picture metadata to the named label properties shown on each slide.

use std::path::Path;

use tracing::debug;

use crate::config::{DisplayOptions, NameStyle};
use crate::error::Result;
use crate::picture::Picture;
use crate::store::{MetadataStore, TagTypeId};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InfoProperty {
    Headline,
    Caption,
    Sublocation,
    City,
    State,
    Country,
    Date,
    Time,
    FolderLocation,
    Folder,
    File,
    FileExtension,
}

impl InfoProperty {
    pub const ALL: [Self; 12] = [
        Self::Headline,
        Self::Caption,
        Self::Sublocation,
        Self::City,
        Self::State,
        Self::Country,
        Self::Date,
        Self::Time,
        Self::FolderLocation,
        Self::Folder,
        Self::File,
        Self::FileExtension,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Headline => "Headline",
            Self::Caption => "Caption",
            Self::Sublocation => "Sublocation",
            Self::City => "City",
            Self::State => "State",
            Self::Country => "Country",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::FolderLocation => "FolderLocation",
            Self::Folder => "Folder",
            Self::File => "File",
            Self::FileExtension => "FileExtension",
        }
    }
}

/// Tag types whose content can be shown on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Headline,
    Caption,
    Sublocation,
    City,
    State,
    Country,
}

impl TagKind {
    pub const ALL: [Self; 6] = [
        Self::Headline,
        Self::Caption,
        Self::Sublocation,
        Self::City,
        Self::State,
        Self::Country,
    ];

    /// Tag type name as stored in the picture database.
    pub fn tag_type_name(&self) -> &'static str {
        match self {
            Self::Headline => "Headline",
            Self::Caption => "Caption/abstract",
            Self::Sublocation => "Sub-location",
            Self::City => "City",
            Self::State => "Province/state",
            Self::Country => "Country/primary location name",
        }
    }

    pub fn property(&self) -> InfoProperty {
        match self {
            Self::Headline => InfoProperty::Headline,
            Self::Caption => InfoProperty::Caption,
            Self::Sublocation => InfoProperty::Sublocation,
            Self::City => InfoProperty::City,
            Self::State => InfoProperty::State,
            Self::Country => InfoProperty::Country,
        }
    }
}

/// Tag-type ids resolved once per session.
#[derive(Debug, Clone, Default)]
pub struct TagTypeIds {
    ids: Vec<(TagKind, TagTypeId)>,
}

impl TagTypeIds {
    pub fn resolve<S: MetadataStore>(store: &S) -> Result<Self> {
        let mut ids = Vec::with_capacity(TagKind::ALL.len());
        for kind in TagKind::ALL {
            match store.tag_type_id(kind.tag_type_name())? {
                Some(id) => ids.push((kind, id)),
                None => debug!(
                    tag_type = kind.tag_type_name(),
                    "tag type not present in picture database"
                ),
            }
        }
        Ok(Self { ids })
    }

    pub fn kind_of(&self, id: TagTypeId) -> Option<TagKind> {
        self.ids
            .iter()
            .find(|(_, known)| *known == id)
            .map(|(kind, _)| *kind)
    }
}

/// Produces the label properties for a picture under the session's options.
#[derive(Debug, Clone)]
pub struct PropertyMapper {
    options: DisplayOptions,
    tag_ids: TagTypeIds,
}

impl PropertyMapper {
    /// Resolves tag-type ids when tags are shown; otherwise no store access.
    pub fn new<S: MetadataStore>(store: &S, options: DisplayOptions) -> Result<Self> {
        let tag_ids = if options.show_tags {
            TagTypeIds::resolve(store)?
        } else {
            TagTypeIds::default()
        };
        Ok(Self { options, tag_ids })
    }

    pub fn properties_for<S: MetadataStore>(
        &self,
        store: &S,
        picture: &Picture,
    ) -> Result<Vec<(InfoProperty, String)>> {
        let mut properties = Vec::new();
        if self.options.show_tags {
            for tag in store.tags_for(picture.id)? {
                if let Some(kind) = self.tag_ids.kind_of(tag.tag_type) {
                    properties.push((kind.property(), tag.content));
                }
            }
        }
        if self.options.show_date {
            properties.extend(date_properties(picture));
        }
        properties.extend(name_properties(picture, self.options.name_style));
        Ok(properties)
    }

    /// Clears every label property, then sets the ones for `picture`.
    pub fn apply<S: MetadataStore, U: Surface + ?Sized>(
        &self,
        store: &S,
        surface: &mut U,
        picture: &Picture,
    ) -> Result<()> {
        let properties = self.properties_for(store, picture)?;
        clear_info(surface);
        for (property, value) in properties {
            surface.set_property(property.name(), &value);
        }
        Ok(())
    }
}

pub fn clear_info<U: Surface + ?Sized>(surface: &mut U) {
    for property in InfoProperty::ALL {
        surface.clear_property(property.name());
    }
}

pub fn date_properties(picture: &Picture) -> [(InfoProperty, String); 2] {
    [
        (
            InfoProperty::Date,
            picture.taken_at.format("%A %B %e, %Y").to_string(),
        ),
        (
            InfoProperty::Time,
            picture.taken_at.format("%I:%M:%S %p").to_string(),
        ),
    ]
}

pub fn name_properties(picture: &Picture, style: NameStyle) -> Vec<(InfoProperty, String)> {
    let file = Path::new(&picture.filename);
    let folder = Path::new(&picture.folder);
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder_name = folder
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match style {
        NameStyle::Disabled => Vec::new(),
        NameStyle::Filename => vec![(InfoProperty::File, stem)],
        NameStyle::Foldername => vec![(InfoProperty::Folder, folder_name)],
        NameStyle::FolderAndFilename => vec![
            (InfoProperty::File, stem),
            (InfoProperty::Folder, format!("{folder_name}/")),
        ],
        NameStyle::FullPath => {
            let location = folder
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = file
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            vec![
                (InfoProperty::File, stem),
                (InfoProperty::Folder, format!("{folder_name}/")),
                (InfoProperty::FolderLocation, format!("{location}/")),
                (InfoProperty::FileExtension, extension),
            ]
        }
    }
}
