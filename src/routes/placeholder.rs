use actix_web::{get, web, HttpResponse};

const DEFAULT_SIZE: u32 = 80;
const MAX_SIZE: u32 = 2000;

/// Dimension bornée à 1..=2000, 80 si illisible
fn dimension(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .map(|n| n.clamp(1, MAX_SIZE))
        .unwrap_or(DEFAULT_SIZE)
}

fn render_svg(width: u32, height: u32) -> String {
    let font_size = (width.min(height) / 4).max(1);
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="#f3f4f6"/><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" font-family="sans-serif" font-size="{font_size}" fill="#9ca3af">{w}x{h}</text></svg>"##,
        w = width,
        h = height,
    )
}

/// GET /api/placeholder/{w}/{h} - Image SVG de remplacement
#[get("/placeholder/{w}/{h}")]
pub async fn placeholder(path: web::Path<(String, String)>) -> HttpResponse {
    let (w, h) = path.into_inner();
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(render_svg(dimension(&w), dimension(&h)))
}

#[cfg(test)]
mod tests {
    use actix_web::App;

    use super::*;

    #[test]
    fn dimensions_are_clamped() {
        assert_eq!(dimension("300"), 300);
        assert_eq!(dimension("0"), 1);
        assert_eq!(dimension("99999"), MAX_SIZE);
        assert_eq!(dimension("abc"), DEFAULT_SIZE);
        assert_eq!(dimension("-5"), DEFAULT_SIZE);
    }

    #[actix_web::test]
    async fn serves_svg() {
        let app = actix_web::test::init_service(App::new().service(placeholder)).await;
        let req = actix_web::test::TestRequest::get().uri("/placeholder/200/100").to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "image/svg+xml"
        );
        let body = actix_web::test::read_body(resp).await;
        let svg = std::str::from_utf8(&body).unwrap();
        assert!(svg.contains(r#"width="200" height="100""#));
        assert!(svg.contains(r#"font-size="25""#));
        assert!(svg.contains(">200x100</text>"));
    }
}
