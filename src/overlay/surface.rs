//! Structural description of what the overlay shows. The controller keeps this
//! in sync with its state; front-ends only read it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Active,
    Hidden,
}

/// An image region. `hidden` flips to true when the resource failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub url: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    Placeholder(String),
    Preview(PreviewCard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCard {
    pub article_id: i64,
    pub headline: String,
    pub excerpt: String,
    pub image: Option<ImageSlot>,
    pub author: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: PageBody,
    pub visibility: Visibility,
}

impl Page {
    pub fn is_active(&self) -> bool {
        self.visibility == Visibility::Active
    }

    pub fn article_id(&self) -> Option<i64> {
        match &self.body {
            PageBody::Preview(card) => Some(card.article_id),
            PageBody::Placeholder(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Headline,
    Content,
    ImageUrl,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Headline => FormField::Content,
            FormField::Content => FormField::ImageUrl,
            FormField::ImageUrl => FormField::Headline,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Headline => FormField::ImageUrl,
            FormField::Content => FormField::Headline,
            FormField::ImageUrl => FormField::Content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitForm {
    pub visible: bool,
    pub headline: String,
    pub content: String,
    pub image_url: String,
    pub focus: FormField,
}

impl SubmitForm {
    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Headline => &mut self.headline,
            FormField::Content => &mut self.content,
            FormField::ImageUrl => &mut self.image_url,
        }
    }

    pub fn clear(&mut self) {
        self.headline.clear();
        self.content.clear();
        self.image_url.clear();
        self.focus = FormField::Headline;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailModal {
    pub article_id: i64,
    pub headline: String,
    pub content: String,
    pub image: Option<ImageSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub container_visible: bool,
    pub background_active: bool,
    pub pages: Vec<Page>,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub page_readout: String,
    pub form: SubmitForm,
    pub modal: Option<DetailModal>,
    /// User-facing warning waiting to be acknowledged.
    pub warning: Option<String>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            container_visible: false,
            background_active: false,
            pages: Vec::new(),
            prev_disabled: true,
            next_disabled: true,
            page_readout: "No Pages".to_string(),
            form: SubmitForm::default(),
            modal: None,
            warning: None,
        }
    }
}

impl Surface {
    pub fn active_page(&self) -> Option<&Page> {
        self.pages.iter().find(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_active()).count()
    }
}
