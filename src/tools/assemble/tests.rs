#[cfg(test)]
mod tests {
    use crate::site::{myresipi, resepichenom};
    use crate::tools::assemble::*;
    use crate::types::{Instructions, RecipeDetails};
    use serde_json::json;

    const FUSION_PAGE: &str = r#"<!DOCTYPE html><html><body>
        <div class="fusion-content-tb">
          <h3> Ayam Masak Merah </h3>
          <p><img srcset="/wp-content/uploads/ayam-300x200.jpg 300w, /wp-content/uploads/ayam-1024x683.jpg 1024w"
                  src="/wp-content/uploads/ayam-300x200.jpg"></p>
          <p><strong>Bahan-bahan</strong></p>
          <ul><li>1 ekor ayam</li><li>3 sudu besar cili kisar</li></ul>
          <p><strong>Cara Memasak</strong></p>
          <ol><li>Goreng ayam separuh masak.</li><li>Tumis cili kisar.</li><li>Masukkan ayam.</li></ol>
        </div>
      </body></html>"#;

    #[test]
    fn test_assembles_fusion_page() {
        let details = assemble_html(FUSION_PAGE, &myresipi()).unwrap();
        let value = serde_json::to_value(&details).unwrap();

        assert_eq!(value["title"], json!("Ayam Masak Merah"));
        assert_eq!(
            value["image_url"],
            json!("https://myresipi.com/wp-content/uploads/ayam-1024x683.jpg")
        );
        assert_eq!(
            value["ingredients"],
            json!({"Bahan-bahan": ["1 ekor ayam", "3 sudu besar cili kisar"]})
        );
        assert_eq!(
            value["instructions"],
            json!(["Goreng ayam separuh masak.", "Tumis cili kisar.", "Masukkan ayam."])
        );
        assert_eq!(value["tips_and_guides"], json!([]));
        assert_eq!(value["servings"], json!(null));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let site = myresipi();
        let first = assemble_html(FUSION_PAGE, &site).unwrap();
        let second = assemble_html(FUSION_PAGE, &site).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_region_is_the_only_failure() {
        let err = assemble_html("<html><body><p>404</p></body></html>", &myresipi()).unwrap_err();
        assert_eq!(
            err,
            AssembleError::ContentMissing {
                site: "myresipi".into()
            }
        );

        // Region present but empty: every field degrades.
        let details =
            assemble_html(r#"<div class="fusion-content-tb"></div>"#, &myresipi()).unwrap();
        assert_eq!(details, RecipeDetails::default());
    }

    const CARD_PAGE: &str = r#"<html><body><main>
        <h1>Nasi Lemak Sambal Sotong</h1>
        <img alt="Nasi Lemak" src="/images/nasi-lemak.webp">
        <div class="grid">
          <div><p class="text-sm">Masa Penyediaan</p><p class="font-semibold">20 minit</p></div>
          <div><p class="text-sm">Masa Memasak</p><p class="font-semibold">45 minit</p></div>
          <div><p class="text-sm">Hidangan</p><p class="font-semibold">4 orang</p></div>
        </div>
        <div class="rounded-xl">
          <div class="font-semibold">Bahan-bahan</div>
          <h4 class="font-medium">Nasi</h4>
          <ul><li><span>•</span><span>2 cawan beras</span></li></ul>
        </div>
        <div class="rounded-xl">
          <div class="font-semibold">Cara Memasak</div>
          <h4 class="font-medium">Nasi</h4>
          <ol><li><span>1</span><span class="flex-1">Masak nasi bersama santan.</span></li></ol>
        </div>
      </main></body></html>"#;

    #[test]
    fn test_assembles_card_page_with_scalars() {
        let details = assemble_html(CARD_PAGE, &resepichenom()).unwrap();

        assert_eq!(details.title.as_deref(), Some("Nasi Lemak Sambal Sotong"));
        assert_eq!(
            details.image_url.as_deref(),
            Some("https://resepichenom.com/images/nasi-lemak.webp")
        );
        assert_eq!(details.preparation_time.as_deref(), Some("20 minit"));
        assert_eq!(details.cooking_time.as_deref(), Some("45 minit"));
        assert_eq!(details.total_time, None);
        assert_eq!(details.servings.as_deref(), Some("4 orang"));
        assert_eq!(details.ingredients.get("Nasi").unwrap(), &["2 cawan beras"]);
        match &details.instructions {
            Instructions::Sectioned(s) => {
                assert_eq!(s.get("Nasi").unwrap(), &["Masak nasi bersama santan."])
            }
            other => panic!("expected sectioned instructions, got {other:?}"),
        }
        assert!(details.tips_and_guides.is_empty());
    }

    #[test]
    fn test_srcset_last_candidate_wins() {
        assert_eq!(pick_srcset_candidate("a.jpg 480w, b.jpg 960w"), Some("b.jpg"));
        assert_eq!(pick_srcset_candidate("only.jpg"), Some("only.jpg"));
        assert_eq!(pick_srcset_candidate(" , "), None);
    }

    #[test]
    fn test_image_resolution_against_base() {
        let base = "https://example.com";
        assert_eq!(
            resolve_image_url(None, Some("/img/c.jpg"), base).as_deref(),
            Some("https://example.com/img/c.jpg")
        );
        assert_eq!(
            resolve_image_url(Some("a.jpg 480w, https://cdn.example.com/b.jpg 960w"), Some("/a.jpg"), base)
                .as_deref(),
            Some("https://cdn.example.com/b.jpg")
        );
        assert_eq!(
            resolve_image_url(Some(""), Some("/img/c.jpg"), base).as_deref(),
            Some("https://example.com/img/c.jpg")
        );
        assert_eq!(resolve_image_url(None, Some("data:image/gif;base64,R0lG"), base), None);
        assert_eq!(resolve_image_url(None, None, base), None);
    }
}
