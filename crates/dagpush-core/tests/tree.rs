//! Tree building, archive and batching tests over whole file sets

use std::collections::HashMap;

use dagpush_core::{
    build_tree, decode_directory, pack_batches, read_car, sha256, write_car, BatchLimits, Block,
    Cid, ContentType, SourceFile,
};

fn site() -> Vec<SourceFile> {
    vec![
        SourceFile::new("index.html", "<h1>hello</h1>"),
        SourceFile::new("about/index.html", "<h1>about</h1>"),
        SourceFile::new("assets/css/site.css", "body { margin: 0 }"),
        SourceFile::new("assets/js/app.js", "console.log('hi')"),
        SourceFile::new("assets/logo.svg", "<svg/>"),
    ]
}

mod determinism {
    use super::*;

    #[test]
    fn test_root_independent_of_enumeration_order() {
        let expected = build_tree(site()).unwrap().root;

        let mut files = site();
        for i in 0..files.len() {
            files.rotate_left(1);
            if i % 2 == 0 {
                files.swap(0, 1);
            }
            assert_eq!(build_tree(files.clone()).unwrap().root, expected);
        }
    }

    #[test]
    fn test_content_change_changes_root() {
        let original = build_tree(site()).unwrap().root;

        let mut files = site();
        files[3].content = b"console.log('bye')".to_vec();
        assert_ne!(build_tree(files).unwrap().root, original);
    }

    #[test]
    fn test_rename_changes_root() {
        let original = build_tree(site()).unwrap().root;

        let mut files = site();
        files[4].path = "assets/logo2.svg".to_string();
        assert_ne!(build_tree(files).unwrap().root, original);
    }
}

mod structure {
    use super::*;

    #[test]
    fn test_every_block_rehashes_to_its_cid() {
        let tree = build_tree(site()).unwrap();
        for block in &tree.blocks {
            assert_eq!(block.cid.digest, sha256(&block.data));
        }
    }

    #[test]
    fn test_block_count_and_order() {
        let tree = build_tree(site()).unwrap();
        // 5 files + about, assets/css, assets/js, assets, root
        assert_eq!(tree.blocks.len(), 10);
        assert!(tree.blocks[..5]
            .iter()
            .all(|b| b.cid.content_type == ContentType::Raw));
        assert!(tree.blocks[5..]
            .iter()
            .all(|b| b.cid.content_type == ContentType::Directory));
        assert_eq!(tree.blocks.last().map(|b| b.cid), Some(tree.root));
    }

    #[test]
    fn test_every_link_resolves_to_a_block() {
        let tree = build_tree(site()).unwrap();
        let by_cid: HashMap<Cid, &Block> = tree.blocks.iter().map(|b| (b.cid, b)).collect();

        let mut stack = vec![tree.root];
        let mut files = 0;
        while let Some(cid) = stack.pop() {
            let block = by_cid[&cid];
            if cid.is_directory() {
                for link in decode_directory(&block.data).unwrap() {
                    stack.push(link.cid);
                }
            } else {
                files += 1;
            }
        }
        assert_eq!(files, 5);
    }

    #[test]
    fn test_display_strings_parse_back() {
        let tree = build_tree(site()).unwrap();
        for block in &tree.blocks {
            let text = block.cid.to_string();
            assert_eq!(text.parse::<Cid>().unwrap(), block.cid);
        }
    }
}

mod archive {
    use super::*;

    #[test]
    fn test_car_roundtrip_preserves_mapping() {
        let tree = build_tree(site()).unwrap();
        let car = write_car(&[tree.root], &tree.blocks).unwrap();

        let expected: HashMap<Cid, Vec<u8>> =
            tree.blocks.iter().map(|b| (b.cid, b.data.clone())).collect();
        let decoded: HashMap<Cid, Vec<u8>> = read_car(&car)
            .unwrap()
            .into_iter()
            .map(|b| (b.cid, b.data))
            .collect();

        assert_eq!(decoded, expected);
    }
}

mod batching {
    use super::*;

    #[test]
    fn test_small_site_fits_two_batches() {
        let tree = build_tree(site()).unwrap();
        let batches = pack_batches(tree.blocks, BatchLimits::default());
        assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![7, 3]);
    }

    #[test]
    fn test_large_files_roll_over_by_size() {
        let files: Vec<SourceFile> = (0..4)
            .map(|i| SourceFile::new(format!("big{}.bin", i), vec![i as u8; 200_000]))
            .collect();
        let tree = build_tree(files).unwrap();
        let batches = pack_batches(tree.blocks, BatchLimits::default());

        // each 200KB file leaves the batch under 256KB, the second one pushes it over
        assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![2, 2, 1]);
    }
}
