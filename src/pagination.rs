/// Builds absolute `previous`/`next` links for an offset-paginated listing.
///
/// `page` is a row offset, so neighbouring pages sit `limit` rows apart.
#[derive(Clone, Debug)]
pub struct PageLinks<'a> {
    pub base_url: &'a str,
    pub path: &'a str,
    pub title: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub limit: u64,
}

impl PageLinks<'_> {
    pub fn url(&self, page: u64) -> String {
        let mut params = Vec::with_capacity(4);
        if let Some(title) = self.title {
            params.push(format!("title={}", urlencoding::encode(title)));
        }
        if let Some(start_date) = self.start_date {
            params.push(format!("start_date={}", urlencoding::encode(start_date)));
        }
        params.push(format!("limit={}", self.limit));
        params.push(format!("page={page}"));

        format!("{}{}?{}", self.base_url.trim_end_matches('/'), self.path, params.join("&"))
    }

    pub fn next(&self, page: u64, has_more: bool) -> Option<String> {
        has_more.then(|| self.url(page.saturating_add(self.limit)))
    }

    pub fn previous(&self, page: u64) -> Option<String> {
        (page > 0).then(|| self.url(page.saturating_sub(self.limit)))
    }
}
